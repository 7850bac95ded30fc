//! In-process cache store.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::cache::{epoch_now, expiry_for, Cache, CacheError};
use crate::observability::metrics;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expiry: Option<f64>,
}

impl Entry {
    fn is_live(&self, now: f64) -> bool {
        self.expiry.map_or(true, |at| at > now)
    }
}

/// A thread-safe cache held in memory; clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entry count.
    pub fn len(&self) -> usize {
        self.sweep();
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(&self) {
        let now = epoch_now();
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.is_live(now));
        let swept = before.saturating_sub(self.inner.len());
        if swept > 0 {
            tracing::debug!(swept, "Swept expired cache entries");
            metrics::record_cache_swept(swept);
        }
    }
}

impl Cache for MemoryCache {
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.sweep();
        self.inner.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expiry: expiry_for(ttl),
            },
        );
        metrics::record_cache_op("set", "ok");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        self.sweep();
        let now = epoch_now();
        match self.inner.get(key).filter(|e| e.is_live(now)) {
            Some(entry) => {
                metrics::record_cache_op("get", "hit");
                Ok(entry.value.clone())
            }
            None => {
                metrics::record_cache_op("get", "miss");
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.sweep();
        self.inner.remove(key);
        metrics::record_cache_op("delete", "ok");
        Ok(())
    }
}
