//! 配置管理模块
//!
//! 提供配置文件解析、验证和热重载功能

pub mod loader;
pub mod provider;
pub mod types;
pub mod watcher;

// 重新导出主要类型
pub use loader::{ConfigLoader, TomlConfigLoader};
pub use provider::FileListProvider;
pub use types::{validate_config, Config, GlobalConfig, ResourceConfig};
pub use watcher::{ConfigChangeEvent, ConfigWatcher};
