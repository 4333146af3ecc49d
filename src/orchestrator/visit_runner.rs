//! 访问调度器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责代理池构建、并发访问调度和结果统计。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置（URL、访问次数、并发上限）
//! 2. **代理池构建**：拉取、验证代理；没有可用代理时直接失败，不启动浏览器
//! 3. **并发控制**：固定数量的 worker，数量 = min(并发上限, 代理数)
//! 4. **领取-执行-记录**：每个 worker 循环领取访问序号和代理，执行后记录结果
//! 5. **全局统计**：汇总成功数与成功率
//!
//! ## 设计特点
//!
//! - **单次失败不致命**：访问失败只计数，不重试，不中断其他 worker
//! - **不会卡死**：领取序号、取代理都是非阻塞操作
//! - **资源所有者**：唯一持有浏览器的模块

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::config::{Config, VisitConfig};
use crate::error::{AppResult, ConfigError};
use crate::models::{ProgressSnapshot, SummaryReport};
use crate::orchestrator::tally::{OutcomeTally, TaskSlots};
use crate::reporter::{self, ConsoleReporter, ProgressReporter};
use crate::services::{HttpProbeValidator, ProxyPool, ProxySourceFetcher};
use crate::workflow::{BrowserVisitExecutor, VisitCtx, VisitExecutor};

/// 本次运行的调度参数
///
/// 只能通过 [`WorkerPoolConfig::new`] 构建：`concurrency` 至少为 1 且不超过可用代理数，
/// `total_sessions` 已经过 [`VisitConfig`] 校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    target_url: String,
    total_sessions: u64,
    concurrency: usize,
}

impl WorkerPoolConfig {
    pub fn new(
        visit: &VisitConfig,
        max_concurrency: usize,
        pool_size: usize,
    ) -> Result<Self, ConfigError> {
        let concurrency = max_concurrency.min(pool_size);
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        Ok(Self {
            target_url: visit.target_url().to_string(),
            total_sessions: visit.total_sessions(),
            concurrency,
        })
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn total_sessions(&self) -> u64 {
        self.total_sessions
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    visit: VisitConfig,
}

impl App {
    /// 初始化应用：配置错误在这里暴露，不会发起任何网络请求
    pub fn initialize(config: Config) -> AppResult<Self> {
        let visit = config.visit_config()?;
        if config.max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency.into());
        }
        Ok(Self { config, visit })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<SummaryReport> {
        reporter::log_startup(
            self.visit.target_url(),
            self.visit.total_sessions(),
            self.config.max_concurrency,
        );

        // 构建代理池（失败即终止，不会启动浏览器）
        let pool = self.build_pool().await?;

        let worker_config =
            WorkerPoolConfig::new(&self.visit, self.config.max_concurrency, pool.len())?;

        let executor = Arc::new(BrowserVisitExecutor::launch(&self.config).await?);
        let progress = ConsoleReporter::new(worker_config.total_sessions);

        let report = run_visits(&worker_config, Arc::new(pool), executor.clone(), &progress).await;
        progress.finish(&report);

        match Arc::try_unwrap(executor) {
            Ok(executor) => executor.shutdown().await,
            Err(_) => warn!("⚠️ 浏览器仍被占用，跳过关闭"),
        }

        Ok(report)
    }

    async fn build_pool(&self) -> AppResult<ProxyPool> {
        info!("\n📁 正在准备代理池...");
        let fetcher = ProxySourceFetcher::new(self.config.source_fetch_timeout())?;
        let validator = HttpProbeValidator::new(
            self.config.validation_target.clone(),
            self.config.validation_timeout(),
        );

        let pool = ProxyPool::initialize(&fetcher, &self.config.proxy_sources, &validator).await?;
        Ok(pool)
    }
}

/// worker 共享的运行状态
struct RunState {
    target_url: String,
    total: u64,
    slots: TaskSlots,
    tally: OutcomeTally,
    pool: Arc<ProxyPool>,
    executor: Arc<dyn VisitExecutor>,
}

/// 启动 worker 池执行所有访问，等待全部 worker 退出后返回汇总
///
/// 单次访问失败只会反映在计数里；这里没有致命错误。
pub async fn run_visits(
    config: &WorkerPoolConfig,
    pool: Arc<ProxyPool>,
    executor: Arc<dyn VisitExecutor>,
    progress: &dyn ProgressReporter,
) -> SummaryReport {
    let concurrency = config.concurrency.min(pool.len());
    reporter::log_run_start(config.total_sessions, concurrency, pool.len());

    let state = Arc::new(RunState {
        target_url: config.target_url.clone(),
        total: config.total_sessions,
        slots: TaskSlots::new(config.total_sessions),
        tally: OutcomeTally::new(config.total_sessions),
        pool,
        executor,
    });

    // 进度通过通道回到当前任务输出，worker 不直接持有 reporter
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handles = Vec::with_capacity(concurrency);
    for worker_id in 1..=concurrency {
        let state = state.clone();
        let tx = tx.clone();
        handles.push((worker_id, tokio::spawn(worker_loop(worker_id, state, tx))));
    }
    drop(tx);

    while let Some(snapshot) = rx.recv().await {
        progress.on_progress(snapshot);
    }

    for (worker_id, handle) in handles {
        match handle.await {
            Ok(done) => debug!("[Worker {}] 退出，共执行 {} 次访问", worker_id, done),
            Err(e) => error!("[Worker {}] 任务执行失败: {}", worker_id, e),
        }
    }

    let snapshot = state.tally.snapshot();
    SummaryReport {
        target_url: config.target_url.clone(),
        total_sessions: config.total_sessions,
        completed: snapshot.completed,
        successful: snapshot.successful,
        concurrency,
    }
}

/// 单个 worker：领取序号 → 取代理 → 执行 → 记录，直到序号领完
async fn worker_loop(
    worker_id: usize,
    state: Arc<RunState>,
    tx: UnboundedSender<ProgressSnapshot>,
) -> u64 {
    let mut done = 0;

    while let Some(slot) = state.slots.claim() {
        let Some(proxy) = state.pool.acquire() else {
            warn!("[Worker {}] ⚠️ 代理池为空，提前退出", worker_id);
            break;
        };
        let ctx = VisitCtx::new(worker_id, slot, state.total, proxy);

        let outcome = state.executor.execute(&ctx.proxy, &state.target_url).await;
        debug!("{} 结果: {:?}", ctx, outcome);

        let snapshot = state.tally.record(outcome);
        done += 1;

        // 接收端只在所有 worker 结束后才关闭
        let _ = tx.send(snapshot);
    }

    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn visit(total: u64) -> VisitConfig {
        VisitConfig::new("https://example.com", total).unwrap()
    }

    #[test]
    fn test_concurrency_capped_by_pool_size() {
        let config = WorkerPoolConfig::new(&visit(10), 30, 7).unwrap();
        assert_eq!(config.concurrency(), 7);
        assert_eq!(config.total_sessions(), 10);
        assert_eq!(config.target_url(), "https://example.com");

        let config = WorkerPoolConfig::new(&visit(10), 3, 7).unwrap();
        assert_eq!(config.concurrency(), 3);
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert!(matches!(
            WorkerPoolConfig::new(&visit(10), 30, 0),
            Err(ConfigError::InvalidConcurrency)
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(
            WorkerPoolConfig::new(&visit(10), 0, 7),
            Err(ConfigError::InvalidConcurrency)
        ));
    }

    #[test]
    fn test_app_initialize_rejects_invalid_config() {
        let config = Config {
            target_url: "example.com".to_string(),
            total_sessions: 5,
            ..Config::default()
        };
        assert!(matches!(
            App::initialize(config),
            Err(AppError::Config(ConfigError::InvalidTargetUrl { .. }))
        ));

        let config = Config {
            target_url: "https://example.com".to_string(),
            total_sessions: 0,
            ..Config::default()
        };
        assert!(matches!(
            App::initialize(config),
            Err(AppError::Config(ConfigError::InvalidSessionCount { .. }))
        ));

        let config = Config {
            target_url: "https://example.com".to_string(),
            total_sessions: 5,
            max_concurrency: 0,
            ..Config::default()
        };
        assert!(matches!(
            App::initialize(config),
            Err(AppError::Config(ConfigError::InvalidConcurrency))
        ));
    }
}
