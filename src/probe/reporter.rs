//! 结果上报
//!
//! 探测结果在产生后立即交给消费方，所有权随之转移

use crate::probe::result::{ProbeEvent, ProbeStats, ResultRecord};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 结果上报器trait
pub trait ResultReporter: Send + Sync {
    /// 上报单个探测结果
    fn report(&self, record: ResultRecord);

    /// 调度循环已退出
    fn stopped(&self);
}

/// 基于通道的上报器
///
/// 事件按产生顺序写入无界通道，消费方从接收端读取
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: mpsc::UnboundedSender<ProbeEvent>,
}

impl ChannelReporter {
    /// 创建上报器及对应的事件接收端
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProbeEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: ProbeEvent) {
        if self.sender.send(event).is_err() {
            debug!("事件接收端已关闭，丢弃事件");
        }
    }
}

impl ResultReporter for ChannelReporter {
    fn report(&self, record: ResultRecord) {
        self.send(ProbeEvent::Result(record));
    }

    fn stopped(&self) {
        self.send(ProbeEvent::Stopped);
    }
}

/// 探测结果回调函数类型
pub type ResultCallback = Arc<dyn Fn(&ResultRecord) + Send + Sync>;

/// 基于回调的上报器
pub struct CallbackReporter {
    on_result: ResultCallback,
    on_stopped: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl CallbackReporter {
    /// 创建回调上报器
    pub fn new(on_result: ResultCallback) -> Self {
        Self {
            on_result,
            on_stopped: None,
        }
    }

    /// 设置停止回调
    pub fn on_stopped(mut self, callback: Arc<dyn Fn() + Send + Sync>) -> Self {
        self.on_stopped = Some(callback);
        self
    }
}

impl ResultReporter for CallbackReporter {
    fn report(&self, record: ResultRecord) {
        (self.on_result)(&record);
    }

    fn stopped(&self) {
        if let Some(ref callback) = self.on_stopped {
            callback();
        }
    }
}

/// 写入结构化日志并累计统计的上报器
#[derive(Debug, Default)]
pub struct LoggingReporter {
    stats: Mutex<ProbeStats>,
}

impl LoggingReporter {
    /// 创建日志上报器
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前统计信息
    pub fn stats(&self) -> ProbeStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ResultReporter for LoggingReporter {
    fn report(&self, record: ResultRecord) {
        crate::logging::LoggingSystem::probe_result_log(&record);

        if !record.success {
            warn!(
                "资源探测失败: {},{}",
                record.resource.display_name(),
                record.error_message.as_deref().unwrap_or("N/A")
            );
        }

        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(&record);
    }

    fn stopped(&self) {
        let stats = self.stats();
        info!(
            "资源检测已停止，累计探测: {}, 成功率: {:.1}%",
            stats.total_probes, stats.success_rate
        );
    }
}
