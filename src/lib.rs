//! Resource Vitals - 网络资源周期性健康监控
//!
//! 这是一个用Rust编写的网络资源健康监控库，支持：
//! - 单任务多路复用的批量HTTP/HTTPS探测
//! - 探测列表的原子整体替换
//! - 配置文件热重载
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod probe;
pub mod resource;

// 重新导出主要类型
pub use config::{Config, GlobalConfig, ResourceConfig};
pub use error::{ProbeError, ResourceVitalsError};
pub use probe::{
    ChannelReporter, CheckerHandle, CycleSummary, MultiplexedProber, ProbeEvent, ProberConfig,
    ResultRecord, ResultReporter, SchedulerLoop,
};
pub use resource::{ResourceDescriptor, ResourceListGuard, ResourceSnapshot};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
