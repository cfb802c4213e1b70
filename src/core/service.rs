//! 服务管理模块
//!
//! 负责配置加载、组件初始化和关闭清理

use crate::cli::args::Args;
use crate::config::{self, ConfigLoader, FileListProvider, TomlConfigLoader};
use crate::probe::{CheckerHandle, LoggingReporter, MultiplexedProber, SchedulerLoop};
use crate::resource::ResourceListGuard;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// 服务组件结构
pub struct ServiceComponents {
    /// 资源列表保护器
    pub guard: Arc<ResourceListGuard>,
    /// 日志上报器，持有累计统计
    pub reporter: Arc<LoggingReporter>,
    /// 资源列表提供方，负责热重载
    pub provider: FileListProvider,
    /// 调度循环句柄
    pub handle: CheckerHandle,
}

/// 服务启动器
pub struct ServiceLauncher;

impl ServiceLauncher {
    /// 加载和验证配置
    ///
    /// # 参数
    /// * `args` - 命令行参数
    /// * `interval` - 可选的检测间隔覆盖值（毫秒）
    ///
    /// # 返回
    /// * `Result<Config>` - 应用覆盖后的配置
    pub async fn load_and_validate_config(
        args: &Args,
        interval: Option<u64>,
    ) -> Result<config::Config> {
        let config_path = args.get_config_path();
        info!("加载配置文件: {:?}", config_path);

        if !config_path.exists() {
            return Err(anyhow::anyhow!(
                "配置文件不存在: {}\n提示：请运行 '{} init' 创建默认配置文件",
                config_path.display(),
                crate::APP_NAME
            ));
        }

        let config_loader = TomlConfigLoader::new(true);
        let mut config = config_loader
            .load_from_file(&config_path)
            .await
            .context("加载配置文件失败")?;

        // 应用命令行参数覆盖
        if let Some(interval) = interval {
            config.global.check_interval_ms = interval;
        }

        config::validate_config(&config).map_err(|e| anyhow::anyhow!("配置验证失败: {}", e))?;

        info!(
            "配置加载成功，共 {} 个资源，其中 {} 个启用",
            config.resources.len(),
            config.enabled_count()
        );
        Ok(config)
    }

    /// 初始化服务组件并启动调度循环
    ///
    /// # 参数
    /// * `config` - 已验证的配置
    /// * `config_path` - 配置文件路径，供热重载使用
    pub fn initialize_service_components(
        config: &config::Config,
        config_path: &Path,
    ) -> ServiceComponents {
        info!("初始化服务组件...");

        let guard = Arc::new(ResourceListGuard::new(config.resource_list()));
        let reporter = Arc::new(LoggingReporter::new());
        let provider = FileListProvider::new(config_path, Arc::clone(&guard));

        let prober = MultiplexedProber::new(config.global.prober_config());
        let handle = SchedulerLoop::new(
            prober,
            Arc::clone(&guard),
            reporter.clone(),
            config.global.check_interval(),
        )
        .spawn();

        ServiceComponents {
            guard,
            reporter,
            provider,
            handle,
        }
    }

    /// 设置配置热重载
    ///
    /// 热重载只替换资源列表，检测间隔等全局参数需要重启生效
    pub fn setup_config_hot_reload(
        service_components: &mut ServiceComponents,
        enabled: bool,
    ) -> Result<()> {
        if !enabled {
            info!("配置热重载已禁用");
            return Ok(());
        }

        service_components
            .provider
            .watch()
            .context("启动配置监控失败")
    }

    /// 处理关闭和清理
    ///
    /// 停止请求在当前周期结束后生效，随后等待循环退出
    pub async fn handle_shutdown_and_cleanup(
        mut shutdown_rx: broadcast::Receiver<()>,
        service_components: ServiceComponents,
    ) -> Result<()> {
        info!("等待关闭信号...");

        if let Err(err) = shutdown_rx.recv().await {
            error!("等待关闭信号失败: {}", err);
        }

        info!("收到关闭信号，正在停止服务...");

        let ServiceComponents {
            reporter,
            mut provider,
            handle,
            ..
        } = service_components;

        provider.stop();
        let cycles = handle.shutdown().await.context("停止资源检测循环失败")?;

        let stats = reporter.stats();
        info!(
            "服务已停止，共完成 {} 个周期，累计探测 {} 次",
            cycles, stats.total_probes
        );
        Ok(())
    }
}
