//! 访问执行器 - 流程层
//!
//! 核心职责：用一个代理完成一次访问，并把结果折叠成 [`VisitOutcome`]
//!
//! 执行器内部的任何错误都不会越过这一层：浏览器错误、导航超时等一律变成
//! `VisitOutcome::Failed`，调用方只需要计数。

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::{Browser, Page};
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::browser;
use crate::config::Config;
use crate::error::BrowserError;
use crate::models::ProxyCandidate;

/// 访问使用的 User-Agent 池
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
];

/// 单次访问结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// 访问成功
    Success,
    /// 访问失败（不会重试）
    Failed,
}

impl VisitOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, VisitOutcome::Success)
    }
}

impl From<bool> for VisitOutcome {
    fn from(ok: bool) -> Self {
        if ok {
            VisitOutcome::Success
        } else {
            VisitOutcome::Failed
        }
    }
}

/// 访问执行能力
///
/// 实现必须自带超时，且永远不向外抛出错误。
#[async_trait]
pub trait VisitExecutor: Send + Sync {
    async fn execute(&self, proxy: &ProxyCandidate, target_url: &str) -> VisitOutcome;
}

/// 一次访问的随机参数（在进入异步流程前生成）
#[derive(Debug, Clone)]
struct VisitPlan {
    user_agent: &'static str,
    settle: Duration,
    scrolls: Vec<(u32, Duration)>,
}

impl VisitPlan {
    fn random() -> Self {
        let mut rng = rand::thread_rng();
        let user_agent = USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]);
        let scroll_count = rng.gen_range(4..=8);
        let scrolls = (0..scroll_count)
            .map(|_| {
                (
                    rng.gen_range(200..=500),
                    Duration::from_millis(rng.gen_range(500..=1500)),
                )
            })
            .collect();
        Self {
            user_agent,
            settle: Duration::from_millis(rng.gen_range(2000..=4000)),
            scrolls,
        }
    }
}

/// 基于 chromiumoxide 的访问执行器
///
/// 所有 worker 共用一个浏览器；每次访问创建独立的浏览器上下文，
/// 上下文携带本次访问的代理，结束后总会被销毁。
pub struct BrowserVisitExecutor {
    browser: Browser,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl BrowserVisitExecutor {
    /// 启动浏览器并创建执行器
    pub async fn launch(config: &Config) -> Result<Self, BrowserError> {
        let (browser, handler) = browser::launch_browser(config).await?;
        Ok(Self {
            browser,
            handler,
            navigation_timeout: config.navigation_timeout(),
        })
    }

    /// 关闭浏览器
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("等待浏览器进程退出失败: {}", e);
        }
        self.handler.abort();
    }

    async fn visit(&self, proxy: &ProxyCandidate, target_url: &str) -> Result<(), BrowserError> {
        let params = CreateBrowserContextParams {
            proxy_server: Some(proxy.proxy_url()),
            ..Default::default()
        };
        let context_id = self
            .browser
            .execute(params)
            .await
            .map_err(|e| BrowserError::context_failed(proxy.to_string(), e))?
            .result
            .browser_context_id;

        let result = self.visit_in_context(&context_id, proxy, target_url).await;

        if let Err(e) = self
            .browser
            .execute(DisposeBrowserContextParams::new(context_id))
            .await
        {
            debug!("销毁浏览器上下文失败 ({}): {}", proxy, e);
        }

        result
    }

    async fn visit_in_context(
        &self,
        context_id: &BrowserContextId,
        proxy: &ProxyCandidate,
        target_url: &str,
    ) -> Result<(), BrowserError> {
        let plan = VisitPlan::random();

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(|e| BrowserError::context_failed(proxy.to_string(), e))?;
        let page = self
            .browser
            .new_page(target)
            .await
            .map_err(|e| BrowserError::context_failed(proxy.to_string(), e))?;

        let result = self.drive_page(&page, &plan, target_url).await;

        if let Err(e) = page.close().await {
            debug!("关闭页面失败 ({}): {}", proxy, e);
        }

        result
    }

    async fn drive_page(
        &self,
        page: &Page,
        plan: &VisitPlan,
        target_url: &str,
    ) -> Result<(), BrowserError> {
        page.execute(SetUserAgentOverrideParams::new(plan.user_agent)).await?;

        timeout(self.navigation_timeout, page.goto(target_url))
            .await
            .map_err(|_| BrowserError::Timeout {
                operation: format!("导航到 {}", target_url),
                timeout_ms: self.navigation_timeout.as_millis() as u64,
            })?
            .map_err(|source| BrowserError::NavigationFailed {
                url: target_url.to_string(),
                source,
            })?;

        sleep(plan.settle).await;

        for (distance, pause) in &plan.scrolls {
            page.evaluate(format!("window.scrollBy(0, {})", distance)).await?;
            sleep(*pause).await;
        }

        Ok(())
    }
}

#[async_trait]
impl VisitExecutor for BrowserVisitExecutor {
    async fn execute(&self, proxy: &ProxyCandidate, target_url: &str) -> VisitOutcome {
        match self.visit(proxy, target_url).await {
            Ok(()) => VisitOutcome::Success,
            Err(e) => {
                debug!("访问失败 (代理: {}): {}", proxy, e);
                VisitOutcome::Failed
            }
        }
    }
}
