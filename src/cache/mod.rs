//! cache
//!
//! Release-pair cache with TTL support.
//!
//! # Design
//!
//! Entries are JSON values addressed by `(namespace, key)`. Each entry
//! carries an absolute expiry computed from the TTL at write time; an expired
//! entry reads as absent. Writes are last-writer-wins, no locking across
//! processes.
//!
//! The cache is advisory. Callers treat a read failure as a miss and ignore
//! write failures.
//!
//! Providers:
//! - [`FileCache`]: one JSON file per entry under `~/.upstep/cache` (default).
//!   [`create_cache`] prunes its expired files at most once a day.
//! - [`MemoryCache`]: process-local, for tests and one-shot runs
//!
//! # Example
//!
//! ```
//! use upstep::cache::{MemoryCache, ReleaseCache};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let cache = MemoryCache::new();
//! cache.set("ns", "key", json!({"v": 1}), 55).await.unwrap();
//! assert_eq!(cache.get("ns", "key").await.unwrap(), Some(json!({"v": 1})));
//! # });
//! ```

mod file;
mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub use file::FileCache;
pub use memory::MemoryCache;

/// The default cache provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Minimum hours between prunes of a file cache directory.
pub const PRUNE_INTERVAL_HOURS: i64 = 24;

/// Errors from cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading an entry failed
    #[error("cache read error: {0}")]
    ReadError(String),

    /// Writing an entry failed
    #[error("cache write error: {0}")]
    WriteError(String),

    /// Unknown provider or provider initialization failed
    #[error("cache provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Namespaced key/value cache with per-entry expiry.
#[async_trait]
pub trait ReleaseCache: Send + Sync {
    /// Get a live entry.
    ///
    /// Returns `Ok(None)` when the entry is missing or expired.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store an entry that expires `ttl_minutes` from now.
    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl_minutes: u32,
    ) -> Result<(), CacheError>;
}

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Expiry instant for an entry written at `now`.
pub(crate) fn expires_at(now: DateTime<Utc>, ttl_minutes: u32) -> DateTime<Utc> {
    now + Duration::minutes(i64::from(ttl_minutes))
}

/// Names accepted by [`create_cache`].
pub fn valid_provider_names() -> &'static [&'static str] {
    &["file", "memory"]
}

/// Create a cache by provider name.
///
/// `dir` overrides the file provider's directory (default `~/.upstep/cache`).
/// Opening a file cache removes its expired entries when the last prune is
/// older than [`PRUNE_INTERVAL_HOURS`]; a failed prune is logged and ignored.
///
/// # Errors
///
/// Unknown provider names, or no home directory for the file provider.
pub fn create_cache(
    provider: &str,
    dir: Option<PathBuf>,
) -> Result<Arc<dyn ReleaseCache>, CacheError> {
    match provider {
        "file" => {
            let dir = match dir {
                Some(d) => d,
                None => FileCache::default_dir()?,
            };
            let cache = FileCache::new(dir);
            if let Err(e) = cache.prune_if_due(Duration::hours(PRUNE_INTERVAL_HOURS)) {
                warn!(dir = %cache.dir().display(), error = %e, "cache prune failed");
            }
            Ok(Arc::new(cache))
        }
        "memory" => Ok(Arc::new(MemoryCache::new())),
        other => Err(CacheError::ProviderNotAvailable(format!(
            "unknown cache provider: '{}' (valid: {})",
            other,
            valid_provider_names().join(", ")
        ))),
    }
}
