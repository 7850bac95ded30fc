//! SQLite-backed cache store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::cache::{epoch_now, expiry_for, Cache, CacheError};
use crate::observability::metrics;

/// Expected layout of the backing store.
pub const SCHEMA: &str = include_str!("schema.sql");

/// Cache persisted in a single SQLite file (or memory).
///
/// A freshly opened file is not checked; call [`SqliteCache::validate`]
/// before use, or open through [`SqliteCache::open_validated`].
pub struct SqliteCache {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) the store at `path` without touching its contents.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        Ok(Self {
            path: Some(path),
            conn: Mutex::new(conn),
        })
    }

    /// A ready-to-use store that lives as long as the value.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    /// Open `path` and fail unless its schema already matches [`SCHEMA`].
    pub fn open_checked(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let cache = Self::open(path)?;
        cache.validate()?;
        Ok(cache)
    }

    /// Open `path` and validate it, recreating the store on a schema mismatch.
    pub fn open_validated(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let cache = Self::open(path)?;
        match cache.validate() {
            Ok(()) => Ok(cache),
            Err(CacheError::Schema { found, .. }) => {
                tracing::warn!(
                    path = ?cache.path,
                    found = %found,
                    "Cache schema mismatch, recreating store"
                );
                cache.setup()?;
                Ok(cache)
            }
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Compare the live schema, whitespace-normalised, with [`SCHEMA`].
    pub fn validate(&self) -> Result<(), CacheError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY rowid")?;
        let statements = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let live: String = statements.iter().map(|s| format!("{s};")).collect::<Vec<_>>().join(" ");
        let found = normalize(&live);
        let expected = normalize(SCHEMA);

        if found != expected {
            return Err(CacheError::Schema { expected, found });
        }
        Ok(())
    }

    /// Drop everything in the store and recreate it empty with [`SCHEMA`].
    ///
    /// Runs as one transaction on the live connection; on error the
    /// previous contents are left as they were.
    pub fn setup(&self) -> Result<(), CacheError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let objects = {
            let mut stmt = tx.prepare(
                "SELECT type, name FROM sqlite_master
                 WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'",
            )?;
            let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        for (kind, name) in &objects {
            let kind = if kind == "view" { "VIEW" } else { "TABLE" };
            tx.execute_batch(&format!("DROP {kind} IF EXISTS \"{}\";", name.replace('"', "\"\"")))?;
        }

        tx.execute_batch(SCHEMA)?;
        tx.commit()?;
        tracing::info!(path = ?self.path, dropped = objects.len(), "Cache store initialised");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    fn sweep(conn: &Connection) -> Result<(), CacheError> {
        let swept = conn.execute(
            "DELETE FROM cache WHERE expiration_timestamp IS NOT NULL AND expiration_timestamp <= ?1",
            params![epoch_now()],
        )?;
        if swept > 0 {
            tracing::debug!(swept, "Swept expired cache entries");
            metrics::record_cache_swept(swept);
        }
        Ok(())
    }
}

impl Cache for SqliteCache {
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let conn = self.lock()?;
        Self::sweep(&conn)?;

        conn.execute(
            "INSERT INTO cache (key, value, expiration_timestamp) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                 expiration_timestamp = excluded.expiration_timestamp",
            params![key, value, expiry_for(ttl)],
        )?;
        metrics::record_cache_op("set", "ok");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let conn = self.lock()?;
        Self::sweep(&conn)?;

        let value: Option<Option<Vec<u8>>> = conn
            .query_row("SELECT value FROM cache WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;

        match value {
            Some(bytes) => {
                metrics::record_cache_op("get", "hit");
                Ok(bytes.unwrap_or_default())
            }
            None => {
                metrics::record_cache_op("get", "miss");
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        let conn = self.lock()?;
        Self::sweep(&conn)?;

        conn.execute("DELETE FROM cache WHERE key = ?1", params![key])?;
        metrics::record_cache_op("delete", "ok");
        Ok(())
    }
}

fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}
