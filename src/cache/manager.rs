//! Cache store for raw API payloads
//!
//! Provides a `CacheStore` that keeps one timestamped JSON snapshot per key in
//! a `KeyValueStore`, returning it while fresh and otherwise running the
//! supplied live fetcher.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::error::FetchError;

/// Default staleness threshold in seconds
pub const DEFAULT_MAX_AGE_SECS: u64 = 600;

/// Wrapper struct for cached data stored in the backend
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The raw payload
    data: T,
    /// When the payload was written
    cached_at: DateTime<Utc>,
}

/// Per-request caching options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Maximum age of a cached payload before a live fetch is required
    pub max_age_secs: u64,
    /// Skip the cache read and always fetch
    pub force_refresh: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            force_refresh: false,
        }
    }
}

impl FetchOptions {
    pub fn with_max_age(mut self, max_age_secs: u64) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }

    pub fn forced(mut self) -> Self {
        self.force_refresh = true;
        self
    }

    fn max_age_millis(&self) -> i64 {
        i64::try_from(self.max_age_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Reads and writes cached payloads
///
/// Cloning is cheap; clones share the same backend and clock.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Creates a CacheStore over the given backend using the wall clock
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for freshness checks and timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the cached payload for `key` if fresh, otherwise runs `fetcher`
    ///
    /// # Behavior
    /// - Unless `force_refresh` is set, a payload younger than `max_age_secs`
    ///   is returned without calling `fetcher`
    /// - Otherwise `fetcher` runs; on success the payload is stored and returned
    /// - Fetcher errors are returned unchanged, even if a stale entry exists
    /// - Unreadable entries count as a miss; failed writes are logged only
    /// - Entries stamped later than the clock's now (skew) count as stale
    pub async fn get<F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        options: &FetchOptions,
    ) -> Result<Value, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, FetchError>>,
    {
        if !options.force_refresh {
            if let Some(entry) = self.read_entry(key) {
                let age = self.clock.now() - entry.cached_at;
                if age.num_milliseconds() < 0 {
                    warn!(key, cached_at = %entry.cached_at, "cache entry is from the future, refetching");
                } else if age.num_milliseconds() < options.max_age_millis() {
                    debug!(key, age_secs = age.num_seconds(), "cache hit");
                    return Ok(entry.data);
                } else {
                    debug!(key, age_secs = age.num_seconds(), "cache entry stale");
                }
            }
        }

        let data = fetcher().await?;
        self.write_entry(key, &data);
        Ok(data)
    }

    /// Returns the stored payload and its timestamp regardless of age
    pub fn peek(&self, key: &str) -> Option<(Value, DateTime<Utc>)> {
        self.read_entry(key).map(|entry| (entry.data, entry.cached_at))
    }

    fn read_entry(&self, key: &str) -> Option<CacheEntry<Value>> {
        let raw = self.backend.read(key)?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(key, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    fn write_entry(&self, key: &str, data: &Value) {
        let entry = CacheEntry {
            data,
            cached_at: self.clock.now(),
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.backend.write(key, &json) {
            warn!(key, error = %e, "failed to write cache entry");
        }
    }
}
