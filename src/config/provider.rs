//! 本地文件资源列表提供方
//!
//! 从配置文件加载资源列表，并在文件变更后整体替换保护器中的列表

use crate::config::loader::{ConfigLoader, TomlConfigLoader};
use crate::config::types::Config;
use crate::config::watcher::{ConfigChangeEvent, ConfigWatcher};
use crate::resource::ResourceListGuard;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 默认防抖动延迟
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// 基于本地TOML文件的资源列表提供方
pub struct FileListProvider {
    config_path: PathBuf,
    guard: Arc<ResourceListGuard>,
    watcher: Option<ConfigWatcher>,
    listener: Option<JoinHandle<()>>,
}

impl FileListProvider {
    /// 创建提供方
    ///
    /// # 参数
    /// * `config_path` - 配置文件路径
    /// * `guard` - 资源列表保护器
    pub fn new<P: AsRef<Path>>(config_path: P, guard: Arc<ResourceListGuard>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            guard,
            watcher: None,
            listener: None,
        }
    }

    /// 加载配置文件并安装其中的资源列表
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置
    pub async fn load(&self) -> Result<Config> {
        let loader = TomlConfigLoader::new(true);
        let config = loader
            .load_from_file(&self.config_path)
            .await
            .with_context(|| format!("加载配置文件失败: {}", self.config_path.display()))?;

        self.guard.update(config.resource_list());
        Ok(config)
    }

    /// 启用热重载，文件变更后整体替换资源列表
    pub fn watch(&mut self) -> Result<()> {
        let (mut watcher, receiver) = ConfigWatcher::new(&self.config_path, DEFAULT_DEBOUNCE)?;
        watcher.start()?;

        let guard = Arc::clone(&self.guard);
        self.listener = Some(tokio::spawn(Self::apply_updates(receiver, guard)));
        self.watcher = Some(watcher);

        info!("已启用资源列表热重载: {}", self.config_path.display());
        Ok(())
    }

    /// 将配置变更事件应用到保护器
    async fn apply_updates(
        mut receiver: broadcast::Receiver<ConfigChangeEvent>,
        guard: Arc<ResourceListGuard>,
    ) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    Self::apply(&event, &guard);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("配置变更事件积压，跳过 {} 个旧版本", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// 应用单个配置变更事件
    pub fn apply(event: &ConfigChangeEvent, guard: &ResourceListGuard) -> u64 {
        let resources = event.new_config.resource_list();
        info!(
            "配置版本 {} 已生效，资源数量: {}",
            event.version,
            resources.len()
        );
        guard.update(resources)
    }

    /// 停止热重载
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

impl Drop for FileListProvider {
    fn drop(&mut self) {
        self.stop();
    }
}
