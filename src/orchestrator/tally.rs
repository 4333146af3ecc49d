//! 共享计数器
//!
//! worker 之间唯一会被同时修改的两个值：待领取的访问序号、结果计数。
//! 两者都只暴露"领取"和"记录"操作，不暴露裸的读-改-写。

use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::ProgressSnapshot;
use crate::workflow::VisitOutcome;

/// 访问序号分发器
///
/// 按顺序发放 `1..=total`，每个序号只会被领取一次；领完之后 `claim` 返回 `None`。
#[derive(Debug)]
pub struct TaskSlots {
    claimed: AtomicU64,
    total: u64,
}

impl TaskSlots {
    pub fn new(total: u64) -> Self {
        Self {
            claimed: AtomicU64::new(0),
            total,
        }
    }

    /// 领取下一个访问序号
    pub fn claim(&self) -> Option<u64> {
        let total = self.total;
        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < total).then_some(n + 1)
            })
            .ok()
            .map(|prev| prev + 1)
    }

    /// 尚未被领取的数量
    pub fn remaining(&self) -> u64 {
        self.total - self.claimed.load(Ordering::Acquire)
    }
}

const SUCCESS_UNIT: u64 = 1;
const COMPLETED_UNIT: u64 = 1 << 32;
const LOW_MASK: u64 = COMPLETED_UNIT - 1;

/// 结果计数器
///
/// 已完成数放在高 32 位、成功数放在低 32 位，一次 `fetch_add` 同时更新两者，
/// 因此任何一次观察到的快照都满足 `successful <= completed`。
#[derive(Debug)]
pub struct OutcomeTally {
    packed: AtomicU64,
    total: u64,
}

impl OutcomeTally {
    /// `total` 不能超过 `u32::MAX`（由 [`crate::config::VisitConfig`] 保证）
    pub fn new(total: u64) -> Self {
        Self {
            packed: AtomicU64::new(0),
            total,
        }
    }

    /// 记录一次结果，返回记录之后的快照
    pub fn record(&self, outcome: VisitOutcome) -> ProgressSnapshot {
        let delta = if outcome.is_success() {
            COMPLETED_UNIT + SUCCESS_UNIT
        } else {
            COMPLETED_UNIT
        };
        let prev = self.packed.fetch_add(delta, Ordering::AcqRel);
        self.unpack(prev + delta)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.unpack(self.packed.load(Ordering::Acquire))
    }

    fn unpack(&self, packed: u64) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: packed >> 32,
            successful: packed & LOW_MASK,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_slots_are_sequential_and_bounded() {
        let slots = TaskSlots::new(3);
        assert_eq!(slots.claim(), Some(1));
        assert_eq!(slots.claim(), Some(2));
        assert_eq!(slots.remaining(), 1);
        assert_eq!(slots.claim(), Some(3));
        assert_eq!(slots.claim(), None);
        assert_eq!(slots.claim(), None);
        assert_eq!(slots.remaining(), 0);
    }

    #[test]
    fn test_zero_slots() {
        let slots = TaskSlots::new(0);
        assert_eq!(slots.claim(), None);
    }

    #[test]
    fn test_tally_counts() {
        let tally = OutcomeTally::new(4);
        tally.record(VisitOutcome::Success);
        tally.record(VisitOutcome::Failed);
        let snapshot = tally.record(VisitOutcome::Success);
        assert_eq!(snapshot.completed, 3);
        assert_eq!(snapshot.successful, 2);
        assert_eq!(snapshot.total, 4);
        assert_eq!(tally.snapshot(), snapshot);
    }

    #[test]
    fn test_concurrent_claims_are_unique() {
        let slots = Arc::new(TaskSlots::new(10_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slots = slots.clone();
                std::thread::spawn(move || {
                    let mut mine = Vec::new();
                    while let Some(slot) = slots.claim() {
                        mine.push(slot);
                    }
                    mine
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for slot in handle.join().unwrap() {
                assert!(all.insert(slot), "序号 {} 被重复领取", slot);
            }
        }
        assert_eq!(all.len(), 10_000);
        assert!(all.iter().all(|s| (1..=10_000).contains(s)));
    }

    #[test]
    fn test_concurrent_records_never_lose_updates() {
        let tally = Arc::new(OutcomeTally::new(8_000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let tally = tally.clone();
                std::thread::spawn(move || {
                    for i in 0..1_000 {
                        let snapshot = tally.record(((i + t) % 2 == 0).into());
                        assert!(snapshot.successful <= snapshot.completed);
                        assert!(snapshot.completed <= snapshot.total);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = tally.snapshot();
        assert_eq!(snapshot.completed, 8_000);
        assert_eq!(snapshot.successful, 4_000);
    }
}
