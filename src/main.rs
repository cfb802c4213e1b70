//! Resource Vitals 主程序入口
//!
//! 网络资源周期性健康监控工具

use anyhow::{Context, Result};
use clap::Parser;
use resource_vitals::cli::{execute_command, Args};
use resource_vitals::logging::{LogConfig, LoggingSystem};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统
    let log_file = args.get_log_file();
    if let Some(parent) = log_file.as_deref().and_then(|path| path.parent()) {
        std::fs::create_dir_all(parent).context("创建日志目录失败")?;
    }

    let log_config = LogConfig {
        level: args.log_level.clone().into(),
        console: log_file.is_none(),
        file_path: log_file,
        json_format: args.json_logs,
        ..Default::default()
    };

    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("Resource Vitals v{} 启动", resource_vitals::VERSION);

    // 执行命令
    if let Err(e) = execute_command(&args).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
