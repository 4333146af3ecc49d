//! # Proxy Visit
//!
//! 通过代理池并发访问目标网站的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 启动浏览器，持有浏览器进程
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理代理
//! - `ProxySourceFetcher` - 并发拉取代理源
//! - `HttpProbeValidator` - 代理存活验证
//! - `ProxyPool` - 验证后的代理池，轮询分配
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次访问"的完整流程
//! - `VisitCtx` - 上下文封装（worker + 序号 + 代理）
//! - `VisitExecutor` - 单次访问，结果只有成功/失败
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/visit_runner` - worker 池调度，管理资源和并发
//! - `orchestrator/tally` - 访问序号与结果计数
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod reporter;
pub mod services;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, VisitConfig};
pub use error::{AppError, AppResult, ConfigError, PoolError};
pub use models::{ProgressSnapshot, ProxyCandidate, SummaryReport};
pub use orchestrator::{run_visits, App, WorkerPoolConfig};
pub use reporter::{ConsoleReporter, ProgressReporter};
pub use services::{HttpProbeValidator, ProxyPool, ProxySourceFetcher, ProxyValidator};
pub use workflow::{BrowserVisitExecutor, VisitExecutor, VisitOutcome};
