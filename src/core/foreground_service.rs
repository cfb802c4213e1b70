//! 前台服务模块
//!
//! 处理前台模式的启动和信号处理

use crate::cli::args::Args;
use crate::core::service::ServiceLauncher;
use anyhow::Result;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

/// 前台服务
pub struct ForegroundService;

impl ForegroundService {
    /// 创建新的前台服务
    pub fn new() -> Self {
        Self
    }

    /// 启动前台模式，直到收到Ctrl+C
    ///
    /// # 参数
    /// * `args` - 命令行参数
    /// * `interval` - 可选的检测间隔覆盖值（毫秒）
    /// * `hot_reload` - 是否启用配置热重载
    pub async fn start(&self, args: &Args, interval: Option<u64>, hot_reload: bool) -> Result<()> {
        info!("以前台模式启动服务...");

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        // 设置Ctrl+C信号处理
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("收到中断信号，正在停止服务...");
                    let _ = shutdown_tx.send(());
                }
                Err(err) => {
                    error!("监听中断信号失败: {}", err);
                }
            }
        });

        self.run_service_main(args, interval, hot_reload, shutdown_rx)
            .await
    }

    /// 运行服务主逻辑
    async fn run_service_main(
        &self,
        args: &Args,
        interval: Option<u64>,
        hot_reload: bool,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        // 1. 加载和验证配置
        let config_path = args.get_config_path();
        let config = ServiceLauncher::load_and_validate_config(args, interval).await?;

        // 2. 初始化核心组件并启动调度循环
        let mut service_components =
            ServiceLauncher::initialize_service_components(&config, &config_path);

        // 3. 设置配置热重载
        ServiceLauncher::setup_config_hot_reload(&mut service_components, hot_reload)?;

        info!("资源检测服务已启动");

        // 4. 等待关闭信号并清理
        ServiceLauncher::handle_shutdown_and_cleanup(shutdown_rx, service_components).await
    }
}

impl Default for ForegroundService {
    fn default() -> Self {
        Self::new()
    }
}
