//! cache::file
//!
//! On-disk cache, one JSON file per entry.
//!
//! File names are the hex SHA-256 of `namespace:key`, so arbitrary keys map
//! to safe, fixed-length names. The body repeats namespace and key; a hash
//! collision or a foreign file reads as a miss.
//!
//! Unreadable, unparseable or expired files read as absent. Writes go to a
//! per-writer temp file that is renamed into place, so concurrent writers of
//! one key never share a temp file and the last rename wins.
//!
//! Disk access runs on tokio's blocking pool.
//!
//! Expired files are only deleted on read of the same key or by
//! [`FileCache::prune_expired`]. [`FileCache::prune_if_due`] runs the latter
//! at most once per interval, recording the last run in a `.last-prune`
//! marker file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{expires_at, CacheError, Clock, ReleaseCache, SystemClock};

/// Marker recording when the directory was last pruned.
const PRUNE_MARKER: &str = ".last-prune";

/// Distinguishes temp files of concurrent writers within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    namespace: String,
    key: String,
    expires_at: DateTime<Utc>,
    value: Value,
}

/// File-backed [`ReleaseCache`].
pub struct FileCache {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache").field("dir", &self.dir).finish()
    }
}

impl FileCache {
    /// Create a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: PathBuf) -> Self {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    /// Create a cache rooted at `dir` on the given clock.
    pub fn with_clock(dir: PathBuf, clock: Arc<dyn Clock>) -> Self {
        Self { dir, clock }
    }

    /// `~/.upstep/cache`
    pub fn default_dir() -> Result<PathBuf, CacheError> {
        dirs::home_dir()
            .map(|home| home.join(".upstep").join("cache"))
            .ok_or_else(|| {
                CacheError::ProviderNotAvailable("cannot determine home directory".into())
            })
    }

    /// Directory holding the entry files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Delete every expired or unreadable entry file.
    ///
    /// Returns the number of files removed.
    pub fn prune_expired(&self) -> Result<usize, CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::ReadError(format!("cannot list cache: {}", e))),
        };

        let now = self.clock.now();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let live = read_entry(&path).is_some_and(|stored| stored.expires_at > now);
            if !live && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        debug!(dir = %self.dir.display(), removed, "pruned cache");
        Ok(removed)
    }

    /// Run [`prune_expired`](Self::prune_expired) unless it already ran within
    /// `interval`.
    ///
    /// Returns the number of files removed, `0` when the prune was not due.
    pub fn prune_if_due(&self, interval: Duration) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let now = self.clock.now();
        let marker = self.dir.join(PRUNE_MARKER);
        let last = fs::read_to_string(&marker)
            .ok()
            .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|t| t.with_timezone(&Utc));
        if last.is_some_and(|last| now - last < interval) {
            return Ok(0);
        }

        let removed = self.prune_expired()?;
        fs::write(&marker, now.to_rfc3339())
            .map_err(|e| CacheError::WriteError(format!("cannot write prune marker: {}", e)))?;
        Ok(removed)
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", entry_file_stem(namespace, key)))
    }
}

/// Hex SHA-256 of `namespace:key`.
fn entry_file_stem(namespace: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Temp file for one write of `path`, unique per process and per write.
fn temp_path_for(path: &Path) -> PathBuf {
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("{}.{}.tmp", std::process::id(), seq))
}

fn read_entry(path: &Path) -> Option<StoredEntry> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// The stored value at `path`, if it belongs to `namespace`/`key` and is
/// still live at `now`. Expired files are removed.
fn read_live(path: &Path, namespace: &str, key: &str, now: DateTime<Utc>) -> Option<Value> {
    let stored = read_entry(path)?;
    if stored.namespace != namespace || stored.key != key {
        return None;
    }
    if stored.expires_at <= now {
        let _ = fs::remove_file(path);
        return None;
    }
    Some(stored.value)
}

fn write_entry(dir: &Path, path: &Path, content: &[u8]) -> Result<(), CacheError> {
    fs::create_dir_all(dir)
        .map_err(|e| CacheError::WriteError(format!("cannot create cache dir: {}", e)))?;

    let temp_path = temp_path_for(path);
    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| CacheError::WriteError(format!("cannot create temp file: {}", e)))
        .and_then(|mut file| {
            file.write_all(content)
                .and_then(|_| file.sync_all())
                .map_err(|e| CacheError::WriteError(format!("cannot write temp file: {}", e)))
        })
        .and_then(|_| {
            fs::rename(&temp_path, path)
                .map_err(|e| CacheError::WriteError(format!("cannot rename temp file: {}", e)))
        });

    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written
}

#[async_trait]
impl ReleaseCache for FileCache {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, CacheError> {
        let path = self.entry_path(namespace, key);
        let (namespace, key) = (namespace.to_string(), key.to_string());
        let now = self.clock.now();

        tokio::task::spawn_blocking(move || read_live(&path, &namespace, &key, now))
            .await
            .map_err(|e| CacheError::ReadError(format!("cache read task failed: {}", e)))
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl_minutes: u32,
    ) -> Result<(), CacheError> {
        let stored = StoredEntry {
            namespace: namespace.to_string(),
            key: key.to_string(),
            expires_at: expires_at(self.clock.now(), ttl_minutes),
            value,
        };
        let content = serde_json::to_vec(&stored)
            .map_err(|e| CacheError::WriteError(format!("cannot serialize entry: {}", e)))?;

        let dir = self.dir.clone();
        let path = self.entry_path(namespace, key);
        tokio::task::spawn_blocking(move || write_entry(&dir, &path, &content))
            .await
            .map_err(|e| CacheError::WriteError(format!("cache write task failed: {}", e)))?
    }
}
