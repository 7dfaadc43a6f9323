//! Bounded cache of built comparisons.
//!
//! Comparisons are pure functions of two immutable revisions, so an entry
//! keyed by `(from_id, to_id)` never needs invalidation. When the cache is
//! full the oldest insertion is evicted.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::debug;

use super::VersionComparison;

type CacheKey = (String, String);

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, Arc<VersionComparison>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

/// Thread-safe comparison cache.
#[derive(Debug)]
pub struct ComparisonCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
}

impl ComparisonCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries: max_entries.max(1),
        }
    }

    /// If the Mutex is poisoned the lock is recovered; the cache only holds
    /// immutable values, so its contents stay consistent.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("comparison cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn get(&self, from_id: &str, to_id: &str) -> Option<Arc<VersionComparison>> {
        let mut inner = self.lock();
        let key = (from_id.to_string(), to_id.to_string());
        match inner.entries.get(&key).cloned() {
            Some(hit) => {
                inner.hits += 1;
                debug!(from = from_id, to = to_id, "comparison cache hit");
                Some(hit)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, comparison: Arc<VersionComparison>) {
        let mut inner = self.lock();
        let key = (
            comparison.from_revision_id.clone(),
            comparison.to_revision_id.clone(),
        );
        if inner.entries.insert(key.clone(), comparison).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.order.len() > self.max_entries {
            if let Some(evicted) = inner.order.pop_front() {
                inner.entries.remove(&evicted);
                debug!(from = %evicted.0, to = %evicted.1, "evicted cached comparison");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
        }
    }
}
