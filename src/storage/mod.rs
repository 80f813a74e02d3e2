//! # Storage Module - Dataset Cache
//!
//! A TTL-bounded cache in front of the dataset fetcher. Each dataset is
//! stored under its own key as a [`CacheEntry`] holding the validated payload
//! and the time it was fetched.
//!
//! ## Behaviour
//!
//! - **Fresh hit**: an entry younger than the TTL is returned without calling
//!   the fetch closure.
//! - **Miss / expiry**: the fetch closure runs, its result is stored with the
//!   current timestamp and returned.
//! - **Best effort**: a failing backend read counts as a miss, a failing write
//!   is logged and ignored. Backend errors never reach the caller.
//! - **No coalescing**: two callers racing on the same cold key both fetch.
//!
//! ## Backends
//!
//! - [`MemoryBackend`] - per-process map, the default for tests
//! - [`FileBackend`] - one JSON file per key, lets separate CLI runs share a
//!   download within the TTL
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arcdex::storage::{CacheStore, MemoryBackend};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), arcdex::catalog::CatalogError> {
//! let cache = CacheStore::new(Box::new(MemoryBackend::new()));
//! let numbers: Vec<u32> = cache
//!     .get_or_fetch("numbers", Duration::from_secs(300), || async { Ok(vec![1, 2, 3]) })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod clock;

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use clock::{Clock, ManualClock, SystemClock};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::errors::CatalogError;
use crate::config::{CacheBackendKind, CacheConfig};
use crate::metrics;

/// Stored form of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub payload: serde_json::Value,
    pub fetched_at_epoch_millis: i64,
}

impl CacheEntry {
    /// Age in milliseconds at `now`; entries stamped in the future count as age 0.
    pub fn age_millis(&self, now_epoch_millis: i64) -> i64 {
        (now_epoch_millis - self.fetched_at_epoch_millis).max(0)
    }

    /// Fresh until the age strictly exceeds `ttl`.
    pub fn is_fresh(&self, now_epoch_millis: i64, ttl: Duration) -> bool {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age_millis(now_epoch_millis) <= ttl_millis
    }
}

pub struct CacheStore {
    backend: Box<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Box<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Build the backend selected in `[cache]`.
    pub fn from_config(config: &CacheConfig) -> Self {
        let backend: Box<dyn CacheBackend> = match config.backend {
            CacheBackendKind::Memory => Box::new(MemoryBackend::new()),
            CacheBackendKind::File => Box::new(FileBackend::new(Path::new(&config.dir))),
        };
        Self::new(backend)
    }

    /// Return the cached value for `key` if it is younger than `ttl`,
    /// otherwise run `fetch`, store its result and return it.
    ///
    /// Only errors from `fetch` are returned; nothing is stored when it fails.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, CatalogError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        let now = self.clock.now_epoch_millis();
        match self.backend.get(key) {
            Ok(Some(entry)) if entry.is_fresh(now, ttl) => {
                let age = entry.age_millis(now);
                match serde_json::from_value::<T>(entry.payload) {
                    Ok(value) => {
                        metrics::inc_cache_hits();
                        debug!("cache hit for {} (age: {:.1}min)", key, age as f64 / 60_000.0);
                        return Ok(value);
                    }
                    Err(e) => {
                        metrics::inc_cache_misses();
                        warn!("cached payload for {} is unreadable, refetching: {}", key, e);
                    }
                }
            }
            Ok(Some(entry)) => {
                metrics::inc_cache_expired();
                debug!(
                    "cache entry for {} expired (age: {:.1}min)",
                    key,
                    entry.age_millis(now) as f64 / 60_000.0
                );
            }
            Ok(None) => {
                metrics::inc_cache_misses();
                debug!("cache miss for {}", key);
            }
            Err(e) => {
                metrics::inc_cache_io_errors();
                metrics::inc_cache_misses();
                warn!("cache read for {} failed, fetching instead: {}", key, e);
            }
        }

        let value = fetch().await?;
        self.store(key, &value);
        Ok(value)
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("could not serialize {} for caching: {}", key, e);
                return;
            }
        };
        let entry = CacheEntry {
            payload,
            fetched_at_epoch_millis: self.clock.now_epoch_millis(),
        };
        if let Err(e) = self.backend.set(key, &entry) {
            metrics::inc_cache_io_errors();
            warn!("cache write for {} failed: {}", key, e);
        }
    }

    /// Drop one entry. Best effort.
    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            metrics::inc_cache_io_errors();
            warn!("cache invalidate for {} failed: {}", key, e);
        }
    }

    /// Drop every entry. Best effort.
    pub fn clear(&self) {
        if let Err(e) = self.backend.clear() {
            metrics::inc_cache_io_errors();
            warn!("cache clear failed: {}", e);
        }
    }

    /// Timestamp of the stored entry for `key`, if one can be read.
    pub fn fetched_at(&self, key: &str) -> Option<i64> {
        self.backend
            .get(key)
            .ok()
            .flatten()
            .map(|entry| entry.fetched_at_epoch_millis)
    }
}
