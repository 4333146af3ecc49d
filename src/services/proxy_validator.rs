//! 代理验证 - 业务能力层
//!
//! 只负责"这个代理现在能不能用"的判断

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::models::ProxyCandidate;

/// 代理验证能力
///
/// 实现必须可以被并发调用，且不依赖共享的可变状态。
#[async_trait]
pub trait ProxyValidator: Send + Sync {
    /// 验证通过返回该代理，否则返回 `None`
    async fn validate(&self, candidate: ProxyCandidate) -> Option<ProxyCandidate>;
}

/// 通过代理请求固定探测地址的验证器
///
/// 在超时时间内拿到 2xx 响应并读完响应体即视为可用；
/// 网络错误、超时、非 2xx 状态都视为不可用。
#[derive(Debug, Clone)]
pub struct HttpProbeValidator {
    probe_url: String,
    timeout: Duration,
}

impl HttpProbeValidator {
    pub fn new(probe_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            probe_url: probe_url.into(),
            timeout,
        }
    }

    async fn probe(&self, candidate: &ProxyCandidate) -> reqwest::Result<()> {
        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(candidate.proxy_url())?)
            .timeout(self.timeout)
            .build()?;

        client
            .get(&self.probe_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProxyValidator for HttpProbeValidator {
    async fn validate(&self, candidate: ProxyCandidate) -> Option<ProxyCandidate> {
        match self.probe(&candidate).await {
            Ok(()) => Some(candidate),
            Err(e) => {
                debug!("代理 {} 验证失败: {}", candidate, e);
                None
            }
        }
    }
}
