//! HTTP传输层
//!
//! 按TLS校验组合构建共享的HTTP客户端，构建单个探测请求，
//! 并执行一次完整传输（响应头与响应体）

use crate::error::{ProbeError, TransportFailure};
use crate::resource::{ResourceDescriptor, TlsProfile};
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::{redirect, Client, Request};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// 单次传输的测量结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应体字节数
    pub bytes: u64,
}

/// 传输结果：总耗时与成功/失败
#[derive(Debug)]
pub struct TransferOutcome {
    /// 从开始连接到传输结束的耗时
    pub elapsed: Duration,
    /// 传输结果
    pub result: std::result::Result<Transfer, TransportFailure>,
}

/// 客户端构建参数
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// 默认User-Agent
    pub user_agent: String,
    /// 连接超时
    pub connect_timeout: Option<Duration>,
    /// 最大重定向次数
    pub max_redirects: usize,
    /// 每个主机保留的最大空闲连接数，通常取批次大小
    ///
    /// reqwest不限制并发连接数，同一批次的请求不会被限流
    pub max_idle_per_host: usize,
}

/// 本周期使用的客户端集合，每种TLS校验组合一个客户端
///
/// 客户端共同扮演多路复用控制器的角色，只在单个周期内存活
#[derive(Debug)]
pub struct ClientPool {
    clients: BTreeMap<TlsProfile, Client>,
}

impl ClientPool {
    /// 为一批资源构建客户端集合
    ///
    /// # 参数
    /// * `settings` - 客户端构建参数
    /// * `resources` - 本批次的资源
    ///
    /// # 返回
    /// * `Result<Self, ProbeError>` - 任一客户端构建失败即为致命错误
    pub fn build<'a>(
        settings: &ClientSettings,
        resources: impl IntoIterator<Item = &'a ResourceDescriptor>,
    ) -> std::result::Result<Self, ProbeError> {
        let mut clients = BTreeMap::new();

        for resource in resources {
            let profile = resource.tls_profile();
            if clients.contains_key(&profile) {
                continue;
            }
            let client = Self::build_client(settings, profile)?;
            debug!("创建HTTP客户端: {:?}", profile);
            clients.insert(profile, client);
        }

        Ok(Self { clients })
    }

    fn build_client(
        settings: &ClientSettings,
        profile: TlsProfile,
    ) -> std::result::Result<Client, ProbeError> {
        let mut builder = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .pool_max_idle_per_host(settings.max_idle_per_host.max(1))
            .danger_accept_invalid_certs(profile.skip_peer_verification)
            .danger_accept_invalid_hostnames(profile.skip_hostname_verification);

        if let Some(connect_timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        builder.build().map_err(ProbeError::MultiplexerFatal)
    }

    /// 客户端数量
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// 是否没有任何客户端
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// 为单个资源构建探测请求
    ///
    /// # 参数
    /// * `resource` - 资源描述
    ///
    /// # 返回
    /// * `Result<(Client, Request), ProbeError>` - 客户端与已构建的请求
    pub fn prepare(
        &self,
        resource: &ResourceDescriptor,
    ) -> std::result::Result<(Client, Request), ProbeError> {
        let construction = |reason: String| ProbeError::Construction {
            url: resource.url.clone(),
            reason,
        };

        let client = self
            .clients
            .get(&resource.tls_profile())
            .ok_or_else(|| construction("没有匹配的HTTP客户端".to_string()))?;

        let mut request = client.get(&resource.url);

        if let Some(timeout) = resource.timeout() {
            request = request.timeout(timeout);
        }

        if let Some(user_agent) = resource.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
            let value = HeaderValue::from_str(user_agent)
                .map_err(|e| construction(format!("无效的User-Agent: {e}")))?;
            request = request.header(USER_AGENT, value);
        }

        let request = request.build().map_err(|e| construction(e.to_string()))?;

        Ok((client.clone(), request))
    }
}

/// 执行一次完整传输
///
/// 读取全部响应体以测量下载速率，内容本身被丢弃
pub async fn execute(client: Client, request: Request) -> TransferOutcome {
    let started = Instant::now();
    let result = perform(&client, request).await;

    TransferOutcome {
        elapsed: started.elapsed(),
        result: result.map_err(|e| TransportFailure::classify(&e)),
    }
}

async fn perform(client: &Client, request: Request) -> reqwest::Result<Transfer> {
    let mut response = client.execute(request).await?;
    let status_code = response.status().as_u16();

    let mut bytes = 0u64;
    while let Some(chunk) = response.chunk().await? {
        bytes += chunk.len() as u64;
    }

    Ok(Transfer { status_code, bytes })
}
