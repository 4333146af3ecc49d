//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责并发调度和结果统计，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `visit_runner` - 访问调度器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 构建代理池（失败即终止）
//! - 固定数量的 worker 并发执行访问
//! - 管理浏览器资源
//! - 输出全局统计信息
//!
//! ### `tally` - 共享计数器
//! - 访问序号的原子领取
//! - 成功/完成计数的原子记录
//!
//! ## 层次关系
//!
//! ```text
//! visit_runner (处理 1..=N 次访问)
//!     ↓
//! workflow::VisitExecutor (处理单次访问)
//!     ↓
//! services (能力层：proxy_source / proxy_validator / proxy_pool)
//!     ↓
//! browser (基础设施：浏览器)
//! ```

pub mod tally;
pub mod visit_runner;

// 重新导出主要类型
pub use tally::{OutcomeTally, TaskSlots};
pub use visit_runner::{run_visits, App, WorkerPoolConfig};
