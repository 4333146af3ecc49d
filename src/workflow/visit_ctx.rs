//! 单次访问上下文
//!
//! 封装"哪个 worker 在用哪个代理执行第几次访问"这一信息

use std::fmt::Display;

use crate::models::ProxyCandidate;

/// 单次访问上下文（只用于日志）
#[derive(Debug, Clone)]
pub struct VisitCtx {
    /// worker 编号（从1开始）
    pub worker_id: usize,

    /// 访问序号（从1开始）
    pub slot: u64,

    /// 访问总数
    pub total: u64,

    /// 本次使用的代理
    pub proxy: ProxyCandidate,
}

impl VisitCtx {
    pub fn new(worker_id: usize, slot: u64, total: u64, proxy: ProxyCandidate) -> Self {
        Self {
            worker_id,
            slot,
            total,
            proxy,
        }
    }
}

impl Display for VisitCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Worker {} 访问#{}/{} 代理#{}]",
            self.worker_id, self.slot, self.total, self.proxy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = VisitCtx::new(2, 5, 10, ProxyCandidate::new("1.1.1.1", 80));
        assert_eq!(ctx.to_string(), "[Worker 2 访问#5/10 代理#1.1.1.1:80]");
    }
}
