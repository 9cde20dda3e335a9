//! On-disk response cache
//!
//! Successful responses are stored as one JSON file per URL, named by the
//! SHA-256 of the URL and sharded by its first two hex characters. Entries
//! remember when they were fetched so an optional maximum age can force a
//! refetch.

use crate::fetch::client::Response;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::PathBuf;
use url::Url;

/// A cached response with its fetch time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the response was fetched
    pub fetched_at: DateTime<Utc>,

    /// The cached response
    pub response: Response,
}

impl CacheEntry {
    pub fn new(response: Response) -> Self {
        Self {
            fetched_at: Utc::now(),
            response,
        }
    }

    /// Returns the age of the entry
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }
}

/// Response cache rooted at a directory
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    max_age: Option<Duration>,
}

impl ResponseCache {
    /// Creates a cache in `dir`; `max_age_secs` of None keeps entries forever
    ///
    /// An age too large for a [`Duration`] also keeps entries forever.
    pub fn new(dir: PathBuf, max_age_secs: Option<u64>) -> Self {
        let max_age = max_age_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds);
        Self { dir, max_age }
    }

    /// Path of the cache file for a URL
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_str().as_bytes());
        let key = hex::encode(hasher.finalize());
        self.dir.join(&key[..2]).join(format!("{}.json", key))
    }

    /// Loads a fresh cached response
    ///
    /// Missing, unreadable, corrupt and stale entries all count as a miss.
    pub async fn load(&self, url: &Url) -> Option<Response> {
        let path = self.path_for(url);
        let raw = tokio::fs::read(&path).await.ok()?;

        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(url = %url, "Ignoring corrupt cache entry: {}", e);
                return None;
            }
        };

        if self.is_stale(&entry) {
            tracing::debug!(url = %url, "Cache entry is stale");
            return None;
        }

        Some(entry.response)
    }

    /// Stores a response
    ///
    /// Only 2xx responses are cached. The entry is written to a temporary file
    /// first and renamed into place so readers never see half an entry.
    pub async fn store(&self, url: &Url, response: &Response) -> io::Result<()> {
        if !(200..300).contains(&response.status) {
            return Ok(());
        }

        let path = self.path_for(url);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let entry = CacheEntry::new(response.clone());
        let json = serde_json::to_vec(&entry).map_err(io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn is_stale(&self, entry: &CacheEntry) -> bool {
        match self.max_age {
            Some(max_age) => entry.age() > max_age,
            None => false,
        }
    }
}
