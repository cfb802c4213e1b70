//! 探测结果数据结构
//!
//! 定义单次探测的结果记录、事件类型和统计信息

use crate::resource::ResourceDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// 单个资源的探测结果
///
/// `resource` 是原始资源描述的完整副本，资源列表被替换后依然有效
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// 结果ID
    pub id: Uuid,
    /// 所属探测周期ID
    pub cycle_id: Uuid,
    /// 完成时间戳
    pub timestamp: DateTime<Utc>,
    /// 来源资源
    pub resource: ResourceDescriptor,
    /// 是否成功
    pub success: bool,
    /// 错误信息（仅失败时存在）
    pub error_message: Option<String>,
    /// 总耗时
    #[serde(rename = "elapsed_time_seconds", with = "seconds_serde")]
    pub elapsed: Duration,
    /// 平均下载速率（字节/秒），未测得时为0
    pub download_rate_bytes_per_second: f64,
    /// HTTP状态码（收到响应时存在）
    pub status_code: Option<u16>,
    /// 下载的响应体字节数
    pub bytes_downloaded: u64,
}

impl ResultRecord {
    /// 创建成功结果
    ///
    /// # 参数
    /// * `cycle_id` - 探测周期ID
    /// * `resource` - 来源资源
    /// * `elapsed` - 总耗时
    ///
    /// # 返回
    /// * `Self` - 结果实例
    pub fn success(cycle_id: Uuid, resource: ResourceDescriptor, elapsed: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            cycle_id,
            timestamp: Utc::now(),
            resource,
            success: true,
            error_message: None,
            elapsed,
            download_rate_bytes_per_second: 0.0,
            status_code: None,
            bytes_downloaded: 0,
        }
    }

    /// 创建失败结果
    ///
    /// # 参数
    /// * `cycle_id` - 探测周期ID
    /// * `resource` - 来源资源
    /// * `elapsed` - 总耗时
    /// * `error_message` - 失败原因
    ///
    /// # 返回
    /// * `Self` - 结果实例
    pub fn failure(
        cycle_id: Uuid,
        resource: ResourceDescriptor,
        elapsed: Duration,
        error_message: String,
    ) -> Self {
        Self {
            success: false,
            error_message: Some(error_message),
            ..Self::success(cycle_id, resource, elapsed)
        }
    }

    /// 设置HTTP状态码
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// 设置下载字节数，并据此计算平均速率
    pub fn with_transfer(mut self, bytes: u64) -> Self {
        self.bytes_downloaded = bytes;
        self.download_rate_bytes_per_second = transfer_rate(bytes, self.elapsed);
        self
    }

    /// 耗时（秒）
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// 耗时（毫秒）
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// 转换为JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从JSON字符串创建
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// 计算平均传输速率（字节/秒）
fn transfer_rate(bytes: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if bytes == 0 || seconds <= 0.0 {
        0.0
    } else {
        bytes as f64 / seconds
    }
}

/// 以秒为单位的浮点数序列化Duration
mod seconds_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
    }
}

/// 发布给消费方的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ProbeEvent {
    /// 单个探测完成
    Result(ResultRecord),
    /// 调度循环已退出
    Stopped,
}

impl ProbeEvent {
    /// 获取结果记录（如果是结果事件）
    pub fn as_result(&self) -> Option<&ResultRecord> {
        match self {
            ProbeEvent::Result(record) => Some(record),
            ProbeEvent::Stopped => None,
        }
    }

    /// 是否为停止事件
    pub fn is_stopped(&self) -> bool {
        matches!(self, ProbeEvent::Stopped)
    }
}

/// 单个探测周期的汇总
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    /// 周期ID
    pub cycle_id: Uuid,
    /// 快照版本号
    pub snapshot_version: u64,
    /// 成功构建并提交的探测数
    pub submitted: usize,
    /// 因构建失败被跳过的资源数
    pub skipped: usize,
    /// 已发出结果的探测数
    pub completed: usize,
    /// 成功数
    pub succeeded: usize,
    /// 失败数
    pub failed: usize,
    /// 关联标签失效被丢弃的完成事件数
    pub dropped: usize,
    /// 周期总耗时
    pub elapsed: Duration,
}

impl CycleSummary {
    pub(crate) fn new(cycle_id: Uuid, snapshot_version: u64) -> Self {
        Self {
            cycle_id,
            snapshot_version,
            submitted: 0,
            skipped: 0,
            completed: 0,
            succeeded: 0,
            failed: 0,
            dropped: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// 记录一个已发出的结果
    pub(crate) fn record(&mut self, record: &ResultRecord) {
        self.completed += 1;
        if record.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// 探测统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeStats {
    /// 总探测次数
    pub total_probes: u64,
    /// 成功次数
    pub successful_probes: u64,
    /// 失败次数
    pub failed_probes: u64,
    /// 平均耗时（毫秒）
    pub average_elapsed_ms: f64,
    /// 最大耗时（毫秒）
    pub max_elapsed_ms: u64,
    /// 最小耗时（毫秒）
    pub min_elapsed_ms: u64,
    /// 成功率（百分比）
    pub success_rate: f64,
    /// 最后探测时间
    pub last_probe_time: Option<DateTime<Utc>>,
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self {
            total_probes: 0,
            successful_probes: 0,
            failed_probes: 0,
            average_elapsed_ms: 0.0,
            max_elapsed_ms: 0,
            min_elapsed_ms: u64::MAX,
            success_rate: 0.0,
            last_probe_time: None,
        }
    }
}

impl ProbeStats {
    /// 更新统计信息
    pub fn update(&mut self, record: &ResultRecord) {
        self.total_probes += 1;
        self.last_probe_time = Some(record.timestamp);

        if record.success {
            self.successful_probes += 1;
        } else {
            self.failed_probes += 1;
        }

        let elapsed_ms = record.elapsed_ms();
        self.max_elapsed_ms = self.max_elapsed_ms.max(elapsed_ms);
        self.min_elapsed_ms = self.min_elapsed_ms.min(elapsed_ms);

        let total_time = self.average_elapsed_ms * (self.total_probes - 1) as f64
            + elapsed_ms as f64;
        self.average_elapsed_ms = total_time / self.total_probes as f64;

        self.success_rate =
            (self.successful_probes as f64 / self.total_probes as f64) * 100.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor::new("https://example.com", 1000).with_index(2)
    }

    #[test]
    fn test_failure_record_carries_message() {
        let record = ResultRecord::failure(
            Uuid::new_v4(),
            descriptor(),
            Duration::from_millis(10),
            "Request timeout".to_string(),
        );

        assert!(!record.success);
        assert_eq!(record.error_message.as_deref(), Some("Request timeout"));
        assert_eq!(record.download_rate_bytes_per_second, 0.0);
        assert_eq!(record.resource.index, 2);
    }

    #[test]
    fn test_transfer_rate_calculation() {
        let record = ResultRecord::success(Uuid::new_v4(), descriptor(), Duration::from_millis(500))
            .with_status_code(200)
            .with_transfer(1000);

        assert!(record.success);
        assert!(record.error_message.is_none());
        assert_eq!(record.bytes_downloaded, 1000);
        assert!((record.download_rate_bytes_per_second - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_elapsed_rate_is_unmeasured() {
        let record = ResultRecord::success(Uuid::new_v4(), descriptor(), Duration::ZERO)
            .with_transfer(1000);
        assert_eq!(record.download_rate_bytes_per_second, 0.0);
    }

    #[test]
    fn test_record_json_field_names() {
        let record = ResultRecord::success(Uuid::new_v4(), descriptor(), Duration::from_millis(1500));
        let json = record.to_json().unwrap();

        assert!(json.contains("\"elapsed_time_seconds\": 1.5"));
        assert!(json.contains("download_rate_bytes_per_second"));
        assert!(json.contains("https://example.com"));

        let parsed = ResultRecord::from_json(&json).unwrap();
        assert_eq!(parsed.elapsed, record.elapsed);
        assert_eq!(parsed.resource, record.resource);
    }

    #[test]
    fn test_probe_event_helpers() {
        let record = ResultRecord::success(Uuid::new_v4(), descriptor(), Duration::ZERO);
        let event = ProbeEvent::Result(record.clone());
        assert_eq!(event.as_result(), Some(&record));
        assert!(!event.is_stopped());
        assert!(ProbeEvent::Stopped.is_stopped());
        assert!(ProbeEvent::Stopped.as_result().is_none());
    }

    #[test]
    fn test_probe_stats_update() {
        let mut stats = ProbeStats::default();
        let cycle_id = Uuid::new_v4();

        stats.update(&ResultRecord::success(
            cycle_id,
            descriptor(),
            Duration::from_millis(100),
        ));
        assert_eq!(stats.total_probes, 1);
        assert_eq!(stats.success_rate, 100.0);
        assert_eq!(stats.average_elapsed_ms, 100.0);

        stats.update(&ResultRecord::failure(
            cycle_id,
            descriptor(),
            Duration::from_millis(200),
            "Connection refused".to_string(),
        ));
        assert_eq!(stats.total_probes, 2);
        assert_eq!(stats.failed_probes, 1);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.average_elapsed_ms, 150.0);
        assert_eq!(stats.max_elapsed_ms, 200);
        assert_eq!(stats.min_elapsed_ms, 100);
    }
}
