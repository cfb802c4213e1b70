//! 资源模块
//!
//! 提供资源描述结构和资源列表的并发保护

pub mod descriptor;
pub mod guard;

// 重新导出主要类型
pub use descriptor::{ResourceDescriptor, TlsProfile};
pub use guard::{ResourceListGuard, ResourceSnapshot};
