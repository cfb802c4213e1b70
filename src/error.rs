//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use std::error::Error as _;
use std::io;
use thiserror::Error;

/// Resource Vitals 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum ResourceVitalsError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 探测相关错误
    #[error("探测错误: {0}")]
    Probe(#[from] ProbeError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 探测周期错误类型
#[derive(Error, Debug)]
pub enum ProbeError {
    /// 探测句柄无法构建，该资源在本周期内被跳过
    #[error("探测句柄构建失败: {url} - {reason}")]
    Construction { url: String, reason: String },

    /// 多路复用控制器初始化失败，整个周期中止
    #[error("多路复用器初始化失败: {0}")]
    MultiplexerFatal(#[source] reqwest::Error),

    /// 完成事件的关联标签找不到对应的资源
    #[error("无效的关联标签: {tag}")]
    StaleCorrelation { tag: u64 },
}

/// 传输失败分类，用于生成失败结果中的错误信息
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// 请求超时
    #[error("Request timeout")]
    Timeout,

    /// 域名解析失败
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// TLS握手或证书错误
    #[error("SSL/TLS certificate error: {0}")]
    Tls(String),

    /// 连接被拒绝
    #[error("Connection refused")]
    ConnectionRefused,

    /// 其他传输错误
    #[error("Request failed: {0}")]
    Other(String),
}

impl TransportFailure {
    /// 从reqwest错误中归类传输失败原因
    ///
    /// 顶层错误的描述包含请求URL，文本匹配只作用于其下的source链
    pub fn classify(error: &reqwest::Error) -> Self {
        if error.is_timeout() || has_io_error_kind(error, io::ErrorKind::TimedOut) {
            return TransportFailure::Timeout;
        }

        if has_io_error_kind(error, io::ErrorKind::ConnectionRefused) {
            return TransportFailure::ConnectionRefused;
        }

        let chain = error_chain_text(error);
        let causes = error
            .source()
            .map(cause_chain_text)
            .unwrap_or_default()
            .to_lowercase();

        if causes.contains("dns error")
            || causes.contains("failed to lookup address")
            || causes.contains("name or service not known")
            || causes.contains("no such host")
        {
            TransportFailure::Dns(chain)
        } else if causes.contains("certificate")
            || causes.contains("tls")
            || causes.contains("ssl")
            || causes.contains("handshake")
        {
            TransportFailure::Tls(chain)
        } else if causes.contains("connection refused") {
            TransportFailure::ConnectionRefused
        } else if causes.contains("timed out") {
            TransportFailure::Timeout
        } else {
            TransportFailure::Other(chain)
        }
    }
}

/// 错误链中是否存在指定类型的IO错误
fn has_io_error_kind(error: &(dyn std::error::Error + 'static), kind: io::ErrorKind) -> bool {
    let mut current = Some(error);
    while let Some(cause) = current {
        if cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io_error| io_error.kind() == kind)
        {
            return true;
        }
        current = cause.source();
    }
    false
}

/// 拼接错误及其全部source的描述
fn error_chain_text(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    if let Some(source) = error.source() {
        let causes = cause_chain_text(source);
        if !text.contains(&causes) {
            text.push_str(": ");
            text.push_str(&causes);
        }
    }
    text
}

/// 从给定错误开始拼接整条source链，重复的描述只保留一次
fn cause_chain_text(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ResourceVitalsError>;
