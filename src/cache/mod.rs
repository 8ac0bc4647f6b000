//! Cache module for storing raw API responses
//!
//! Responses are kept as timestamped JSON snapshots in a pluggable key-value
//! backend (files under the XDG cache directory by default). A snapshot is
//! served while younger than the caller's staleness threshold; anything older
//! triggers a live fetch that overwrites it.

mod manager;
mod store;

pub use manager::{
    CacheStore, Clock, FetchOptions, ManualClock, SystemClock, DEFAULT_MAX_AGE_SECS,
};
pub use store::{FileStore, KeyValueStore, MemoryStore};
