//! Persistent key-value store backing the catalog cache.
//!
//! One JSON file per key under the cache directory. All operations go
//! through `tokio::fs`, so nothing here blocks the caller's control flow.
//! Different keys live in different files, so concurrent operations on
//! different keys cannot corrupt each other; writes to the same key are
//! made visible atomically via a temp-file rename.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A single stored entry: the opaque value plus its optional expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }
}

/// Durable key-value store with optional per-entry expiry.
///
/// Expired entries are never returned; the `get` that observes one removes
/// it as a side effect (lazy eviction), so no external sweep is required.
#[derive(Debug, Clone)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Store `value` under `key`, overwriting any existing entry.
    ///
    /// With a `ttl` the entry expires at `now + ttl`; without one it never
    /// expires.
    pub async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                Utc::now()
                    + chrono::Duration::from_std(ttl).context("TTL out of range")?,
            ),
            None => None,
        };
        let entry = StoredEntry { value, expires_at };
        let contents = serde_json::to_string(&entry)?;

        // Write-then-rename so a concurrent reader of this key never sees
        // a torn entry. Each write gets its own temp file; concurrent
        // writers of the same key race only on the final rename, so the
        // winner is always one intact entry.
        static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);
        let path = self.entry_path(key);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self.dir.join(format!("{}.json.tmp{}", key, seq));
        tokio::fs::write(&tmp, contents)
            .await
            .with_context(|| format!("Failed to write cache entry: {}", key))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to commit cache entry: {}", key))?;
        Ok(())
    }

    /// Fetch the value for `key`.
    ///
    /// Returns `None` if no entry exists, if the entry has expired, or if
    /// the entry file cannot be parsed. Expired and unreadable entries are
    /// removed on the way out.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read cache entry: {}", key))
            }
        };

        let entry: StoredEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                // Corrupt entry reads as a miss; drop it so it heals.
                warn!(key, error = %e, "Unparseable cache entry, removing");
                self.remove(key).await?;
                return Ok(None);
            }
        };

        if entry.is_expired(Utc::now()) {
            debug!(key, "Cache entry expired, removing");
            self.remove(key).await?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    /// Remove the entry for `key`. Removing a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove cache entry: {}", key)),
        }
    }

    /// Remove every entry in the store. Used on logout.
    pub async fn clear(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .context("Failed to list cache directory")?;
        let mut paths = Vec::new();
        while let Some(dir_entry) = entries.next_entry().await? {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }

        let removals = paths.iter().map(tokio::fs::remove_file);
        for (result, path) in futures::future::join_all(removals).await.iter().zip(&paths) {
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "Failed to remove cache entry");
            }
        }
        Ok(())
    }

    /// Whether an entry file physically exists for `key`, ignoring expiry.
    /// Test and diagnostics hook; `get` is the real read path.
    pub async fn contains_raw(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.entry_path(key))
            .await
            .unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================
