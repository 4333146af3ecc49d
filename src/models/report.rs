//! 进度快照与最终报告

use std::fmt;

/// 某一时刻的计数快照
///
/// 由结果计数器一次性生成，保证 `successful <= completed <= total`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: u64,
    pub successful: u64,
    pub total: u64,
}

impl ProgressSnapshot {
    /// 运行中的成功率（成功数 / 已完成数，百分比）
    pub fn running_rate(&self) -> f64 {
        percentage(self.successful, self.completed)
    }
}

/// 运行结束后的汇总报告
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub target_url: String,
    pub total_sessions: u64,
    pub completed: u64,
    pub successful: u64,
    /// 实际使用的并发数
    pub concurrency: usize,
}

impl SummaryReport {
    /// 最终成功率（成功数 / 请求数，百分比）
    pub fn success_rate(&self) -> f64 {
        percentage(self.successful, self.total_sessions)
    }

    pub fn failed(&self) -> u64 {
        self.completed - self.successful
    }
}

/// 百分比，分母为 0 时返回 0
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

/// 保留两位小数的百分比文本
pub struct Rate(pub f64);

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}
