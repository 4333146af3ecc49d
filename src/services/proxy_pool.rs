//! 代理池 - 业务能力层
//!
//! ## 生命周期
//!
//! 1. **构建阶段**：拉取 → 去重 → 并发验证 → 过滤 → 打乱顺序
//! 2. **轮询阶段**：代理列表不再变化，只通过 [`ProxyPool::acquire`] 轮流取出
//!
//! 同一个代理可能同时被多个 worker 使用，池子不做独占锁定。

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use rand::seq::SliceRandom;
use tracing::info;

use crate::error::PoolError;
use crate::models::ProxyCandidate;
use crate::services::proxy_source::ProxySourceFetcher;
use crate::services::proxy_validator::ProxyValidator;

/// 经过验证的代理池
#[derive(Debug)]
pub struct ProxyPool {
    proxies: Vec<ProxyCandidate>,
    /// 始终位于 `0..proxies.len()`
    cursor: AtomicUsize,
}

impl ProxyPool {
    /// 从代理源构建代理池
    ///
    /// 任何代理源失败都不会中断构建；只有在没有任何代理通过验证时才返回
    /// [`PoolError::Exhausted`]。
    pub async fn initialize<V>(
        fetcher: &ProxySourceFetcher,
        sources: &[String],
        validator: &V,
    ) -> Result<Self, PoolError>
    where
        V: ProxyValidator + ?Sized,
    {
        info!("🌐 正在从 {} 个代理源拉取代理...", sources.len());
        let raw = fetcher.fetch_all(sources).await;
        Self::from_candidates(raw, validator).await
    }

    /// 对原始候选去重、并发验证并打乱顺序
    pub async fn from_candidates<V>(
        raw: Vec<ProxyCandidate>,
        validator: &V,
    ) -> Result<Self, PoolError>
    where
        V: ProxyValidator + ?Sized,
    {
        let unique: HashSet<ProxyCandidate> = raw.into_iter().collect();
        let total = unique.len();
        info!("🔍 找到 {} 个不重复的代理，开始实时验证...", total);

        // 全部并发，等待每一个验证都结束（不是谁先返回就用谁）
        let mut proxies: Vec<ProxyCandidate> =
            join_all(unique.into_iter().map(|c| validator.validate(c)))
                .await
                .into_iter()
                .flatten()
                .collect();

        if proxies.is_empty() {
            return Err(PoolError::Exhausted { candidates: total });
        }

        proxies.shuffle(&mut rand::thread_rng());
        info!("✅ 验证完成: {}/{} 个代理可用", proxies.len(), total);

        Ok(Self {
            proxies,
            cursor: AtomicUsize::new(0),
        })
    }

    /// 使用已经验证过的代理直接构建（保持给定顺序）
    pub fn from_validated(proxies: Vec<ProxyCandidate>) -> Result<Self, PoolError> {
        if proxies.is_empty() {
            return Err(PoolError::Exhausted { candidates: 0 });
        }
        Ok(Self {
            proxies,
            cursor: AtomicUsize::new(0),
        })
    }

    /// 轮询取出下一个代理
    ///
    /// 不阻塞；并发调用时每次游标推进都是一次原子的读-改-写。
    pub fn acquire(&self) -> Option<ProxyCandidate> {
        let len = self.proxies.len();
        if len == 0 {
            return None;
        }
        let index = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|current| current);
        self.proxies.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn proxies(&self) -> &[ProxyCandidate] {
        &self.proxies
    }

    /// 当前游标位置
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}
