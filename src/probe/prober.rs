//! 多路复用探测器
//!
//! 在单个任务内驱动一整个探测周期：为快照中的每个资源构建请求，
//! 全部放入同一个 `FuturesUnordered` 中并发推进，按完成顺序逐个上报结果。
//! 不为单个资源创建线程或任务。

use crate::error::ProbeError;
use crate::probe::reporter::ResultReporter;
use crate::probe::result::{CycleSummary, ResultRecord};
use crate::probe::transport::{self, ClientPool, ClientSettings, TransferOutcome};
use crate::resource::{ResourceDescriptor, ResourceSnapshot};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::Future;
use reqwest::{Client, Request};
use std::collections::HashMap;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 默认的兜底等待时间
pub const DEFAULT_FALLBACK_WAIT: Duration = Duration::from_millis(1000);

/// 默认最大重定向次数
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// 探测器配置
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// 默认User-Agent
    pub user_agent: String,
    /// 等待下一个完成事件的最长时间，超时后记录进度并继续等待
    pub fallback_wait: Duration,
    /// 连接超时（可选）
    pub connect_timeout: Option<Duration>,
    /// 最大重定向次数
    pub max_redirects: usize,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("{}/{}", crate::APP_NAME, crate::VERSION),
            fallback_wait: DEFAULT_FALLBACK_WAIT,
            connect_timeout: None,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// 探测句柄的关联标签
pub type ProbeTag = u64;

type InFlight = Pin<Box<dyn Future<Output = (ProbeTag, TransferOutcome)> + Send>>;

/// 单个进行中的探测
///
/// 只存活于一个周期内，完成或周期结束时销毁
struct ProbeHandle {
    tag: ProbeTag,
    client: Client,
    request: Request,
}

impl ProbeHandle {
    fn start(self) -> InFlight {
        let tag = self.tag;
        Box::pin(async move { (tag, transport::execute(self.client, self.request).await) })
    }
}

/// 多路复用探测器
#[derive(Debug, Clone, Default)]
pub struct MultiplexedProber {
    config: ProberConfig,
}

impl MultiplexedProber {
    /// 创建新的探测器
    ///
    /// # 参数
    /// * `config` - 探测器配置
    ///
    /// # 返回
    /// * `Self` - 探测器实例
    pub fn new(config: ProberConfig) -> Self {
        Self { config }
    }

    /// 获取探测器配置
    pub fn config(&self) -> &ProberConfig {
        &self.config
    }

    /// 对快照执行一个完整的探测周期
    ///
    /// # 参数
    /// * `snapshot` - 本周期使用的资源快照，周期内保持不变
    /// * `reporter` - 结果上报器，每个完成的探测上报一次
    ///
    /// # 返回
    /// * `Result<CycleSummary, ProbeError>` - 周期汇总；多路复用器初始化失败时返回错误且不产生任何结果
    pub async fn run_cycle(
        &self,
        snapshot: &ResourceSnapshot,
        reporter: &dyn ResultReporter,
    ) -> Result<CycleSummary, ProbeError> {
        let started = Instant::now();
        let cycle_id = Uuid::new_v4();
        let mut summary = CycleSummary::new(cycle_id, snapshot.version);

        if snapshot.is_empty() {
            debug!("资源列表为空，跳过本次探测周期");
            return Ok(summary);
        }

        let settings = ClientSettings {
            user_agent: self.config.user_agent.clone(),
            connect_timeout: self.config.connect_timeout,
            max_redirects: self.config.max_redirects,
            max_idle_per_host: snapshot.len(),
        };

        let pool = ClientPool::build(&settings, &snapshot.resources).inspect_err(|e| {
            error!("探测周期中止: {}", e);
        })?;

        // 关联表：标签 -> 资源副本，周期私有
        let mut correlation: HashMap<ProbeTag, ResourceDescriptor> =
            HashMap::with_capacity(snapshot.len());
        let mut in_flight: FuturesUnordered<InFlight> = FuturesUnordered::new();

        for (tag, resource) in (0..).zip(snapshot.resources.iter()) {
            match pool.prepare(resource) {
                Ok((client, request)) => {
                    correlation.insert(tag, resource.clone());
                    in_flight.push(
                        ProbeHandle {
                            tag,
                            client,
                            request,
                        }
                        .start(),
                    );
                }
                Err(e) => {
                    warn!("跳过资源: {}", e);
                    summary.skipped += 1;
                }
            }
        }

        summary.submitted = in_flight.len();
        debug!(
            "探测周期开始: {}, 提交: {}, 跳过: {}",
            cycle_id, summary.submitted, summary.skipped
        );

        while !in_flight.is_empty() {
            let next = tokio::time::timeout(self.config.fallback_wait, in_flight.next()).await;

            let (tag, outcome) = match next {
                Ok(Some(completed)) => completed,
                Ok(None) => break,
                Err(_) => {
                    debug!("探测周期 {} 仍有 {} 个探测进行中", cycle_id, in_flight.len());
                    continue;
                }
            };

            let Some(resource) = correlation.remove(&tag) else {
                debug!("丢弃完成事件: {}", ProbeError::StaleCorrelation { tag });
                summary.dropped += 1;
                continue;
            };

            let record = Self::build_record(cycle_id, resource, outcome);
            summary.record(&record);
            reporter.report(record);
        }

        summary.elapsed = started.elapsed();
        info!(
            "探测周期完成: {}, 成功: {}, 失败: {}, 跳过: {}, 耗时: {}ms",
            cycle_id,
            summary.succeeded,
            summary.failed,
            summary.skipped,
            summary.elapsed.as_millis()
        );

        Ok(summary)
    }

    /// 将传输结果转换为结果记录
    fn build_record(
        cycle_id: Uuid,
        resource: ResourceDescriptor,
        outcome: TransferOutcome,
    ) -> ResultRecord {
        match outcome.result {
            Ok(transfer) => ResultRecord::success(cycle_id, resource, outcome.elapsed)
                .with_status_code(transfer.status_code)
                .with_transfer(transfer.bytes),
            Err(failure) => {
                ResultRecord::failure(cycle_id, resource, outcome.elapsed, failure.to_string())
            }
        }
    }
}
