//! 核心模块
//!
//! 包含服务组件装配和前台运行的生命周期管理

pub mod foreground_service;
pub mod service;

// 重新导出主要类型
pub use foreground_service::ForegroundService;
pub use service::{ServiceComponents, ServiceLauncher};
