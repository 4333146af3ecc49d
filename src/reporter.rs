//! 进度与汇总输出
//!
//! 运行中：单行刷新的进度条（已完成/总数、成功数、运行中成功率）
//! 结束后：一次性输出最终汇总

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::models::{ProgressSnapshot, Rate, SummaryReport};

const PROGRESS_TEMPLATE: &str = "[进度] {pos}/{len} {msg}";

/// 进度输出能力
///
/// worker 把快照发到通道里，由调度任务逐个转交给 `on_progress`；
/// 快照按发送先后到达，不一定按完成数递增。
pub trait ProgressReporter: Send + Sync {
    fn on_progress(&self, snapshot: ProgressSnapshot);
    fn finish(&self, report: &SummaryReport);
}

/// 终端输出
pub struct ConsoleReporter {
    bar: ProgressBar,
    /// 已经渲染过的最大完成数，过时的快照直接丢弃
    rendered: AtomicU64,
}

impl ConsoleReporter {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_TEMPLATE) {
            bar.set_style(style);
        }
        Self {
            bar,
            rendered: AtomicU64::new(0),
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn on_progress(&self, snapshot: ProgressSnapshot) {
        let prev = self.rendered.fetch_max(snapshot.completed, Ordering::AcqRel);
        if snapshot.completed < prev {
            return;
        }
        self.bar.set_position(snapshot.completed);
        self.bar.set_message(progress_message(&snapshot));
    }

    fn finish(&self, report: &SummaryReport) {
        self.bar.finish();
        for line in summary_lines(report) {
            info!("{}", line);
        }
    }
}

/// 进度条后面的文字
pub fn progress_message(snapshot: &ProgressSnapshot) -> String {
    format!(
        "| 成功: {} ({})",
        snapshot.successful,
        Rate(snapshot.running_rate())
    )
}

/// 最终汇总的每一行
pub fn summary_lines(report: &SummaryReport) -> Vec<String> {
    vec![
        format!("\n{}", "=".repeat(60)),
        "📊 最终汇总".to_string(),
        format!(
            "完成时间: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ),
        "=".repeat(60),
        format!("🎯 目标: {}", report.target_url),
        format!("📨 请求访问数: {}", report.total_sessions),
        format!("✅ 成功访问数: {}", report.successful),
        format!("❌ 失败访问数: {}", report.failed()),
        format!("📈 最终成功率: {}", Rate(report.success_rate())),
        "=".repeat(60),
    ]
}

/// 启动信息
pub fn log_startup(target_url: &str, total_sessions: u64, max_concurrency: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 代理轮换访问模式");
    info!("🎯 目标: {}", target_url);
    info!("📨 请求访问数: {}", total_sessions);
    info!("📊 最大并发数: {}", max_concurrency);
    info!("{}", "=".repeat(60));
}

/// 访问开始信息
pub fn log_run_start(total_sessions: u64, concurrency: usize, pool_size: usize) {
    info!(
        "\n[调度] 开始 {} 次访问，并发数 {}（可用代理 {} 个）...",
        total_sessions, concurrency, pool_size
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_message_uses_running_rate() {
        let snapshot = ProgressSnapshot {
            completed: 4,
            successful: 1,
            total: 10,
        };
        assert_eq!(progress_message(&snapshot), "| 成功: 1 (25.00%)");
    }

    #[test]
    fn test_summary_lines() {
        let report = SummaryReport {
            target_url: "https://example.com".to_string(),
            total_sessions: 4,
            completed: 4,
            successful: 2,
            concurrency: 2,
        };
        let lines = summary_lines(&report);
        assert!(lines.contains(&"🎯 目标: https://example.com".to_string()));
        assert!(lines.contains(&"📨 请求访问数: 4".to_string()));
        assert!(lines.contains(&"✅ 成功访问数: 2".to_string()));
        assert!(lines.contains(&"📈 最终成功率: 50.00%".to_string()));
    }

    #[test]
    fn test_console_reporter_ignores_stale_snapshots() {
        let reporter = ConsoleReporter::new(10);
        reporter.on_progress(ProgressSnapshot {
            completed: 3,
            successful: 3,
            total: 10,
        });
        reporter.on_progress(ProgressSnapshot {
            completed: 2,
            successful: 2,
            total: 10,
        });
        assert_eq!(reporter.bar.position(), 3);
    }
}
