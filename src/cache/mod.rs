//! Key/value cache with per-entry expiry.
//!
//! # Data Flow
//! ```text
//! set / get / delete
//!     → sweep: drop every entry whose expiry has passed
//!     → operate on the post-sweep state
//!     → CacheError::NotFound on a miss (get only)
//! ```
//!
//! # Design Decisions
//! - A zero TTL never expires
//! - Expiry is checked on every call, no background reaper
//! - The SQLite store validates its schema before use and can be reset
//! - Both stores are safe to share across threads

pub mod memory;
pub mod sqlite;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

/// Cache operations shared by every store.
pub trait Cache: Send + Sync {
    /// Store `value` under `key`, replacing value and expiry of an existing entry.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// The live value under `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>, CacheError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("key `{0}` not found")]
    NotFound(String),

    #[error("cache schema mismatch: expected `{expected}`, found `{found}`")]
    Schema { expected: String, found: String },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cache file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache lock poisoned")]
    Poisoned,
}

impl CacheError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

/// Current time as fractional seconds since the Unix epoch.
pub(crate) fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Expiry instant for `ttl`, `None` for a zero TTL.
pub(crate) fn expiry_for(ttl: Duration) -> Option<f64> {
    if ttl.is_zero() {
        None
    } else {
        Some(epoch_now() + ttl.as_secs_f64())
    }
}
