//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换和错误处理功能

use crate::config::types::{validate_config, Config};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config>;

    /// 从字符串加载配置
    ///
    /// # 参数
    /// * `content` - 配置文件内容
    ///
    /// # 返回
    /// * `Result<Config>` - 加载的配置或错误
    async fn load_from_string(&self, content: &str) -> Result<Config>;

    /// 验证配置
    fn validate(&self, config: &Config) -> Result<()>;
}

/// TOML配置加载器实现
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl TomlConfigLoader {
    /// 创建新的TOML配置加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用环境变量替换
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            enable_env_substitution,
        }
    }

    /// 替换字符串中的 `${VAR_NAME}` 环境变量
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }

    /// 解析TOML内容
    fn parse_toml(&self, content: &str) -> Result<Config> {
        let processed_content = self.substitute_env_vars(content)?;

        let config: Config = toml::from_str(&processed_content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;

        Ok(config)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;

        let config = self.parse_toml(&content)?;
        self.validate(&config)?;

        tracing::info!("成功加载配置文件: {}", path.display());
        tracing::debug!("配置内容: {:?}", config);

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<Config> {
        let config = self.parse_toml(content)?;
        self.validate(&config)?;

        tracing::debug!("成功解析配置字符串");

        Ok(config)
    }

    fn validate(&self, config: &Config) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 获取默认配置文件路径
///
/// 优先使用当前目录下的 `config.toml`，否则使用用户配置目录
pub fn get_default_config_path() -> PathBuf {
    let local = PathBuf::from("config.toml");
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|config_dir| config_dir.join("resource-vitals").join("config.toml"))
        .unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const TEST_CONFIG_TOML: &str = r#"
[global]
check_interval_ms = 500
default_timeout_ms = 2000
log_level = "info"

[[resources]]
name = "Test Resource"
url = "https://example.com/health"
timeout_ms = 1000

[[resources]]
url = "https://self-signed.example.com"
skip_peer_verification = true
skip_hostname_verification = true
"#;

    const TEST_CONFIG_WITH_ENV_VARS: &str = r#"
[global]
user_agent = "${PROBE_AGENT}"

[[resources]]
url = "https://${PROBE_HOST}/ping"
"#;

    #[tokio::test]
    async fn test_toml_parsing() {
        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_string(TEST_CONFIG_TOML).await.unwrap();

        assert_eq!(config.global.check_interval_ms, 500);
        assert_eq!(config.global.fallback_wait_ms, 1000);
        assert_eq!(config.resources.len(), 2);
        assert_eq!(config.resources[0].name.as_deref(), Some("Test Resource"));

        let list = config.resource_list();
        assert_eq!(list[0].timeout_ms, 1000);
        assert_eq!(list[1].timeout_ms, 2000);
        assert!(list[1].skip_peer_verification);
    }

    #[tokio::test]
    async fn test_empty_config_uses_defaults() {
        let loader = TomlConfigLoader::new(false);
        let config = loader.load_from_string("").await.unwrap();

        assert_eq!(config.global.check_interval_ms, 200);
        assert!(config.resources.is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution() {
        env::set_var("PROBE_AGENT", "probe-agent/9.9");
        env::set_var("PROBE_HOST", "status.example.com");

        let loader = TomlConfigLoader::new(true);
        let config = loader
            .load_from_string(TEST_CONFIG_WITH_ENV_VARS)
            .await
            .unwrap();

        assert_eq!(config.global.user_agent.as_deref(), Some("probe-agent/9.9"));
        assert_eq!(config.resources[0].url, "https://status.example.com/ping");

        env::remove_var("PROBE_AGENT");
        env::remove_var("PROBE_HOST");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_var_substitution_missing_var() {
        let loader = TomlConfigLoader::new(true);
        let result = loader
            .load_from_string("[global]\nuser_agent = \"${RESOURCE_VITALS_MISSING_VAR}\"\n")
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("RESOURCE_VITALS_MISSING_VAR"));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let loader = TomlConfigLoader::new(false);
        let result = loader
            .load_from_string("[global]\ncheck_interval_ms = 0\n")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let loader = TomlConfigLoader::new(false);
        let result = loader.load_from_file("/nonexistent/resource-vitals.toml").await;
        assert!(result.unwrap_err().to_string().contains("配置文件不存在"));
    }

    #[test]
    fn test_substitute_env_vars_disabled() {
        let loader = TomlConfigLoader::new(false);
        let content = "test ${VAR} content";
        let result = loader.substitute_env_vars(content).unwrap();
        assert_eq!(result, content);
    }

    #[test]
    fn test_get_default_config_path() {
        let path = get_default_config_path();
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
