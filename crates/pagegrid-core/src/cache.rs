//! Process-local caches
//!
//! Two small caches with explicit ownership: a TTL cache driven by an
//! injectable [`Clock`], and a file cache whose entries are invalidated
//! when the file's modification time changes.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A key/value cache whose entries expire after a fixed time-to-live
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Box<dyn Clock>,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create a cache using the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Box::new(SystemClock))
    }

    /// Create a cache with a custom clock
    pub fn with_clock(ttl: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: HashMap::new(),
        }
    }

    /// Get a live entry
    pub fn get(&self, key: &K) -> Option<V> {
        let (stored, value) = self.entries.get(key)?;
        (self.clock.now().saturating_duration_since(*stored) < self.ttl).then(|| value.clone())
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, key: K, value: V) {
        let now = self.clock.now();
        self.entries.insert(key, (now, value));
    }

    /// Return the live entry or compute, store, and return a new one
    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute();
        self.insert(key, value.clone());
        value
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A per-file cache keyed by path and modification time
#[derive(Debug, Default)]
pub struct FileCache<V> {
    entries: HashMap<PathBuf, (Option<SystemTime>, V)>,
}

impl<V: Clone> FileCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Return the cached value for `path` unless the file changed since
    pub fn get_or_insert_with(&mut self, path: &Path, compute: impl FnOnce(&Path) -> V) -> V {
        let stamp = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        if let Some((cached_stamp, value)) = self.entries.get(path) {
            if *cached_stamp == stamp {
                return value.clone();
            }
        }
        let value = compute(path);
        self.entries
            .insert(path.to_path_buf(), (stamp, value.clone()));
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
