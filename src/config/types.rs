//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::probe::ProberConfig;
use crate::resource::ResourceDescriptor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 主配置结构，包含全局配置和资源列表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 资源配置列表
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 检测间隔（毫秒）
    #[serde(default = "default_check_interval")]
    pub check_interval_ms: u64,
    /// 默认探测超时时间（毫秒）
    #[serde(default = "default_timeout")]
    pub default_timeout_ms: u64,
    /// 等待完成事件的兜底时间（毫秒）
    #[serde(default = "default_fallback_wait")]
    pub fallback_wait_ms: u64,
    /// 连接超时时间（毫秒，可选）
    pub connect_timeout_ms: Option<u64>,
    /// 最大重定向次数
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// 默认User-Agent
    pub user_agent: Option<String>,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// 资源配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceConfig {
    /// 资源名称
    pub name: Option<String>,
    /// 资源URL
    pub url: String,
    /// 探测超时时间（毫秒），未设置时使用全局默认值
    pub timeout_ms: Option<u64>,
    /// 资源特定的User-Agent
    pub user_agent: Option<String>,
    /// 跳过对端证书校验
    #[serde(default)]
    pub skip_peer_verification: bool,
    /// 跳过主机名校验
    #[serde(default)]
    pub skip_hostname_verification: bool,
    /// 是否启用
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// 默认值函数
fn default_check_interval() -> u64 {
    200
}
fn default_timeout() -> u64 {
    5000
}
fn default_fallback_wait() -> u64 {
    1000
}
fn default_max_redirects() -> usize {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_enabled() -> bool {
    true
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            check_interval_ms: default_check_interval(),
            default_timeout_ms: default_timeout(),
            fallback_wait_ms: default_fallback_wait(),
            connect_timeout_ms: None,
            max_redirects: default_max_redirects(),
            user_agent: None,
            log_level: default_log_level(),
        }
    }
}

impl GlobalConfig {
    /// 检测间隔
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// 根据全局配置生成探测器配置
    pub fn prober_config(&self) -> ProberConfig {
        let defaults = ProberConfig::default();
        ProberConfig {
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            fallback_wait: Duration::from_millis(self.fallback_wait_ms),
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            max_redirects: self.max_redirects,
        }
    }
}

impl Config {
    /// 将启用的资源转换为资源描述列表
    ///
    /// `index` 按转换后的位置编号
    pub fn resource_list(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .iter()
            .filter(|resource| resource.enabled)
            .enumerate()
            .map(|(index, resource)| ResourceDescriptor {
                name: resource.name.clone(),
                url: resource.url.clone(),
                timeout_ms: resource.timeout_ms.unwrap_or(self.global.default_timeout_ms),
                user_agent: resource.user_agent.clone(),
                skip_peer_verification: resource.skip_peer_verification,
                skip_hostname_verification: resource.skip_hostname_verification,
                index,
            })
            .collect()
    }

    /// 启用的资源数量
    pub fn enabled_count(&self) -> usize {
        self.resources.iter().filter(|r| r.enabled).count()
    }
}

/// 配置验证函数
///
/// 只校验全局参数，资源URL的合法性在构建探测请求时处理
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.global.check_interval_ms == 0 {
        return Err("检测间隔不能为0".to_string());
    }

    if config.global.fallback_wait_ms == 0 {
        return Err("兜底等待时间不能为0".to_string());
    }

    if config.global.connect_timeout_ms == Some(0) {
        return Err("连接超时时间不能为0".to_string());
    }

    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    Ok(())
}
