//! 调度循环模块
//!
//! 以固定间隔反复执行探测周期，直到收到停止请求。
//! 停止请求只在周期边界生效，进行中的周期总会完整结束。

use crate::probe::prober::MultiplexedProber;
use crate::probe::reporter::ResultReporter;
use crate::resource::{ResourceDescriptor, ResourceListGuard};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 默认检测间隔
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(200);

/// 调度循环
pub struct SchedulerLoop {
    /// 探测器，由循环任务独占
    prober: MultiplexedProber,
    /// 资源列表保护器
    guard: Arc<ResourceListGuard>,
    /// 结果上报器
    reporter: Arc<dyn ResultReporter>,
    /// 检测间隔
    interval: Duration,
}

/// 运行中调度循环的控制句柄
pub struct CheckerHandle {
    guard: Arc<ResourceListGuard>,
    stop_sender: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl SchedulerLoop {
    /// 创建新的调度循环
    ///
    /// # 参数
    /// * `prober` - 探测器
    /// * `guard` - 资源列表保护器
    /// * `reporter` - 结果上报器
    /// * `interval` - 两次周期之间的休眠时间
    ///
    /// # 返回
    /// * `Self` - 调度循环实例
    pub fn new(
        prober: MultiplexedProber,
        guard: Arc<ResourceListGuard>,
        reporter: Arc<dyn ResultReporter>,
        interval: Duration,
    ) -> Self {
        Self {
            prober,
            guard,
            reporter,
            interval,
        }
    }

    /// 在独立任务中启动循环
    ///
    /// # 返回
    /// * `CheckerHandle` - 控制句柄
    pub fn spawn(self) -> CheckerHandle {
        let (stop_sender, stop_receiver) = watch::channel(false);
        let guard = Arc::clone(&self.guard);
        let task = tokio::spawn(self.run(stop_receiver));

        CheckerHandle {
            guard,
            stop_sender,
            task,
        }
    }

    /// 循环主体
    ///
    /// # 返回
    /// * `u64` - 已完成的周期数
    async fn run(self, mut stop_receiver: watch::Receiver<bool>) -> u64 {
        info!("资源检测循环已启动，检测间隔: {}ms", self.interval.as_millis());
        let mut cycles = 0u64;

        loop {
            if *stop_receiver.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = stop_receiver.changed() => {
                    if changed.is_err() {
                        debug!("停止信号发送端已关闭");
                        break;
                    }
                }
            }

            if *stop_receiver.borrow() {
                break;
            }

            // 锁只在获取快照时持有
            let snapshot = self.guard.snapshot();

            match self.prober.run_cycle(&snapshot, self.reporter.as_ref()).await {
                Ok(summary) => {
                    cycles += 1;
                    debug!(
                        "第 {} 个周期结束，快照版本: {}, 完成: {}",
                        cycles, summary.snapshot_version, summary.completed
                    );
                }
                Err(e) => {
                    error!("探测周期失败，等待下一周期重试: {}", e);
                }
            }
        }

        self.reporter.stopped();
        info!("资源检测循环已停止，共完成 {} 个周期", cycles);
        cycles
    }
}

impl CheckerHandle {
    /// 请求停止，当前周期结束后生效
    pub fn stop(&self) {
        if self.stop_sender.send(true).is_err() {
            debug!("调度循环已退出");
        }
    }

    /// 是否已请求停止
    pub fn is_stopping(&self) -> bool {
        *self.stop_sender.borrow()
    }

    /// 循环任务是否已结束
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 整体替换被监控的资源列表
    ///
    /// # 返回
    /// * `u64` - 新快照版本号
    pub fn update_resources(&self, resources: Vec<ResourceDescriptor>) -> u64 {
        self.guard.update(resources)
    }

    /// 资源列表保护器
    pub fn guard(&self) -> &Arc<ResourceListGuard> {
        &self.guard
    }

    /// 等待循环退出
    ///
    /// # 返回
    /// * `anyhow::Result<u64>` - 已完成的周期数
    pub async fn join(self) -> anyhow::Result<u64> {
        self.task
            .await
            .map_err(|e| anyhow::anyhow!("资源检测任务异常退出: {}", e))
    }

    /// 请求停止并等待循环退出
    pub async fn shutdown(self) -> anyhow::Result<u64> {
        self.stop();
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::reporter::ChannelReporter;
    use crate::probe::result::ProbeEvent;

    #[tokio::test]
    async fn test_stop_emits_stopped_event() {
        let guard = Arc::new(ResourceListGuard::new(Vec::new()));
        let (reporter, mut receiver) = ChannelReporter::new();

        let handle = SchedulerLoop::new(
            MultiplexedProber::default(),
            guard,
            Arc::new(reporter),
            Duration::from_millis(10),
        )
        .spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let cycles = handle.shutdown().await.unwrap();

        assert!(cycles >= 1);
        assert_eq!(receiver.recv().await, Some(ProbeEvent::Stopped));
    }

    #[tokio::test]
    async fn test_stop_interrupts_long_sleep() {
        let guard = Arc::new(ResourceListGuard::new(Vec::new()));
        let (reporter, mut receiver) = ChannelReporter::new();

        let handle = SchedulerLoop::new(
            MultiplexedProber::default(),
            guard,
            Arc::new(reporter),
            Duration::from_secs(3600),
        )
        .spawn();

        handle.stop();
        assert!(handle.is_stopping());

        let cycles = tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .expect("loop should exit promptly")
            .unwrap();

        assert_eq!(cycles, 0);
        assert_eq!(receiver.recv().await, Some(ProbeEvent::Stopped));
    }

    #[tokio::test]
    async fn test_update_resources_through_handle() {
        let guard = Arc::new(ResourceListGuard::new(Vec::new()));
        let (reporter, _receiver) = ChannelReporter::new();

        let handle = SchedulerLoop::new(
            MultiplexedProber::default(),
            Arc::clone(&guard),
            Arc::new(reporter),
            Duration::from_secs(3600),
        )
        .spawn();

        let version = handle.update_resources(vec![ResourceDescriptor::new(
            "http://127.0.0.1:1/",
            100,
        )]);
        assert_eq!(version, 1);
        assert_eq!(guard.len(), 1);
        assert!(Arc::ptr_eq(handle.guard(), &guard));

        handle.shutdown().await.unwrap();
    }
}
