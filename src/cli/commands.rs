//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, ConfigTemplate, OutputFormat};
use crate::config::{ConfigLoader, TomlConfigLoader};
use crate::core::ForegroundService;
use crate::error::Result;
use crate::probe::{ChannelReporter, MultiplexedProber, ProbeEvent, ResultRecord};
use crate::resource::ResourceSnapshot;
use async_trait::async_trait;
use std::path::Path;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 根据参数分派命令
pub async fn execute_command(args: &Args) -> Result<()> {
    match &args.command {
        Commands::Start { .. } => StartCommand.execute(args).await,
        Commands::Check { .. } => CheckCommand.execute(args).await,
        Commands::Init { .. } => InitCommand.execute(args).await,
        Commands::Validate { .. } => ValidateCommand.execute(args).await,
        Commands::Version { .. } => VersionCommand.execute(args).await,
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                _ => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Init {
            config_path,
            force,
            template,
        } = &args.command
        {
            self.create_config_file(config_path, *force, template).await
        } else {
            Ok(())
        }
    }
}

impl InitCommand {
    /// 创建配置文件
    async fn create_config_file(
        &self,
        config_path: &Path,
        force: bool,
        template: &ConfigTemplate,
    ) -> Result<()> {
        if config_path.exists() && !force {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(());
        }

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(config_path, Self::template_content(template)).await?;

        println!("配置文件已创建: {}", config_path.display());
        println!("请编辑配置文件以添加需要监控的资源");

        Ok(())
    }

    /// 获取模板内容
    fn template_content(template: &ConfigTemplate) -> &'static str {
        match template {
            ConfigTemplate::Minimal => include_str!("../../demos/minimal_config.toml"),
            ConfigTemplate::Full => include_str!("../../demos/full_config.toml"),
        }
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        {
            let config_file = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, *verbose).await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(config_path).await?;

        if verbose {
            println!("配置验证通过！");
            println!("全局配置:");
            println!("  检测间隔: {}ms", config.global.check_interval_ms);
            println!("  默认超时: {}ms", config.global.default_timeout_ms);
            println!("  兜底等待: {}ms", config.global.fallback_wait_ms);
            println!("  日志级别: {}", config.global.log_level);

            println!("资源配置:");
            for (i, resource) in config.resources.iter().enumerate() {
                println!(
                    "  {}. {} ({})",
                    i + 1,
                    resource.name.as_deref().unwrap_or("-"),
                    resource.url
                );
                println!(
                    "     超时: {}ms",
                    resource
                        .timeout_ms
                        .unwrap_or(config.global.default_timeout_ms)
                );
                println!(
                    "     跳过证书校验: {}, 跳过主机名校验: {}",
                    resource.skip_peer_verification, resource.skip_hostname_verification
                );
                println!(
                    "     启用状态: {}",
                    if resource.enabled { "是" } else { "否" }
                );
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!(
                "✓ 找到 {} 个资源配置，其中 {} 个启用",
                config.resources.len(),
                config.enabled_count()
            );
        }

        Ok(())
    }
}

/// 检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Check { format } = &args.command {
            self.perform_cycle(args, format).await
        } else {
            Ok(())
        }
    }
}

impl CheckCommand {
    /// 执行单个探测周期并输出结果
    async fn perform_cycle(&self, args: &Args, format: &OutputFormat) -> Result<()> {
        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(args.get_config_path()).await?;

        let snapshot = ResourceSnapshot {
            version: 0,
            resources: config.resource_list(),
        };

        if snapshot.is_empty() {
            eprintln!("未找到任何启用的资源");
            return Ok(());
        }

        println!("开始探测 {} 个资源...", snapshot.len());

        let prober = MultiplexedProber::new(config.global.prober_config());
        let (reporter, mut receiver) = ChannelReporter::new();
        let summary = prober.run_cycle(&snapshot, &reporter).await?;
        drop(reporter);

        let mut records = Vec::with_capacity(summary.completed);
        while let Some(event) = receiver.recv().await {
            if let ProbeEvent::Result(record) = event {
                records.push(record);
            }
        }

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
            OutputFormat::Table => Self::print_table_results(&records),
            OutputFormat::Text => Self::print_text_results(&records),
        }

        if summary.skipped > 0 {
            eprintln!("{} 个资源无法构建探测请求，已跳过", summary.skipped);
        }

        if args.is_verbose() {
            println!(
                "周期 {}: 成功 {}, 失败 {}, 耗时 {}ms",
                summary.cycle_id,
                summary.succeeded,
                summary.failed,
                summary.elapsed.as_millis()
            );
        }

        Ok(())
    }

    /// 打印文本格式结果
    fn print_text_results(records: &[ResultRecord]) {
        for record in records {
            let status_icon = if record.success { "✓" } else { "✗" };
            println!(
                "{} {} ({}) - {}ms - {:.0} B/s",
                status_icon,
                record.resource.display_name(),
                record.resource.url,
                record.elapsed_ms(),
                record.download_rate_bytes_per_second
            );

            if let Some(error) = &record.error_message {
                println!("  错误: {error}");
            }
        }
    }

    /// 打印表格格式结果
    fn print_table_results(records: &[ResultRecord]) {
        println!(
            "{:<30} {:<8} {:<8} {:<10} {:<14} {:<30}",
            "资源", "状态", "状态码", "耗时", "速率(B/s)", "错误信息"
        );
        println!("{}", "-".repeat(104));

        for record in records {
            let status = if record.success { "成功" } else { "失败" };
            let status_code = record
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "N/A".to_string());

            println!(
                "{:<30} {:<8} {:<8} {:<10} {:<14.0} {:<30}",
                record.resource.display_name(),
                status,
                status_code,
                format!("{}ms", record.elapsed_ms()),
                record.download_rate_bytes_per_second,
                record.error_message.as_deref().unwrap_or("")
            );
        }
    }
}

/// 启动命令
pub struct StartCommand;

#[async_trait]
impl Command for StartCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Start { interval, no_watch } = &args.command {
            ForegroundService::new()
                .start(args, *interval, !*no_watch)
                .await?;
        }
        Ok(())
    }
}
