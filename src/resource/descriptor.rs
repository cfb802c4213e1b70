//! 资源描述结构定义
//!
//! 定义单个被监控资源的探测参数

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 被监控资源的描述
///
/// 描述在结果记录中以完整副本的形式出现，不引用资源列表的存储
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// 资源名称（可选，仅用于展示）
    #[serde(default)]
    pub name: Option<String>,
    /// 资源URL
    pub url: String,
    /// 探测超时时间（毫秒），0表示不设置单次超时
    pub timeout_ms: u64,
    /// 覆盖默认User-Agent
    #[serde(default)]
    pub user_agent: Option<String>,
    /// 跳过对端证书校验
    #[serde(default)]
    pub skip_peer_verification: bool,
    /// 跳过主机名校验
    #[serde(default)]
    pub skip_hostname_verification: bool,
    /// 在所属快照中的位置
    #[serde(default)]
    pub index: usize,
}

/// TLS校验配置组合，同一组合的资源共享一个HTTP客户端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TlsProfile {
    /// 跳过对端证书校验
    pub skip_peer_verification: bool,
    /// 跳过主机名校验
    pub skip_hostname_verification: bool,
}

impl ResourceDescriptor {
    /// 创建新的资源描述
    ///
    /// # 参数
    /// * `url` - 资源URL
    /// * `timeout_ms` - 超时时间（毫秒）
    ///
    /// # 返回
    /// * `Self` - 资源描述实例
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            name: None,
            url: url.into(),
            timeout_ms,
            user_agent: None,
            skip_peer_verification: false,
            skip_hostname_verification: false,
            index: 0,
        }
    }

    /// 设置资源名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 设置User-Agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// 设置TLS校验开关
    pub fn with_tls_verification(mut self, skip_peer: bool, skip_hostname: bool) -> Self {
        self.skip_peer_verification = skip_peer;
        self.skip_hostname_verification = skip_hostname;
        self
    }

    /// 设置快照位置
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// 探测超时时间，0毫秒视为不限制
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// 该资源所需的TLS校验组合
    pub fn tls_profile(&self) -> TlsProfile {
        TlsProfile {
            skip_peer_verification: self.skip_peer_verification,
            skip_hostname_verification: self.skip_hostname_verification,
        }
    }

    /// 用于日志和输出的显示名称
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let descriptor = ResourceDescriptor::new("https://example.com", 3000)
            .with_name("example")
            .with_user_agent("probe/1.0")
            .with_tls_verification(true, false)
            .with_index(4);

        assert_eq!(descriptor.url, "https://example.com");
        assert_eq!(descriptor.timeout(), Some(Duration::from_millis(3000)));
        assert_eq!(descriptor.user_agent.as_deref(), Some("probe/1.0"));
        assert_eq!(descriptor.index, 4);
        assert_eq!(descriptor.display_name(), "example");
        assert_eq!(
            descriptor.tls_profile(),
            TlsProfile {
                skip_peer_verification: true,
                skip_hostname_verification: false,
            }
        );
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let descriptor = ResourceDescriptor::new("https://example.com", 0);
        assert!(descriptor.timeout().is_none());
        assert_eq!(descriptor.display_name(), "https://example.com");
    }
}
