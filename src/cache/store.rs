//! Durable key-value backends for the cache
//!
//! The cache only needs whole-value string reads and writes, so backends are
//! small: a file-per-key store in the XDG cache directory and an in-memory map.

use directories::ProjectDirs;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// String-keyed, string-valued persistent storage
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent or unreadable
    fn read(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value
    fn write(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Stores each key as a JSON file inside a cache directory
///
/// Uses `~/.cache/marketdash/` on Linux, or the equivalent XDG path on other
/// platforms. Keys are usually URLs, so they are escaped into safe file names.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileStore {
    /// Creates a FileStore using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "marketdash")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a FileStore with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Directory backing this store
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", escape_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.cache_path(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        fs::write(self.cache_path(key), value)
    }
}

/// Escapes a key into a file name. ASCII alphanumerics and `-` are kept,
/// every other byte becomes `_xx` (hex), so distinct keys never collide.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    out
}

/// Process-local store, used in tests and when no cache directory exists
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
