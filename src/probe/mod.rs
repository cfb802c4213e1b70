//! 资源探测模块
//!
//! 提供多路复用探测、结果上报和周期调度功能

pub mod prober;
pub mod reporter;
pub mod result;
pub mod scheduler;
pub mod transport;

// 重新导出主要类型
pub use prober::{MultiplexedProber, ProberConfig};
pub use reporter::{CallbackReporter, ChannelReporter, LoggingReporter, ResultReporter};
pub use result::{CycleSummary, ProbeEvent, ProbeStats, ResultRecord};
pub use scheduler::{CheckerHandle, SchedulerLoop};
