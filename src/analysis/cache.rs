//! Analysis memoization
//!
//! One entry per food key. Each entry remembers the content hash of the
//! inputs it was computed from; a lookup with a different hash recomputes and
//! replaces the entry. The cache holds a bounded number of keys and evicts the
//! oldest insertion first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

/// Hash the parts that determine an analysis result.
///
/// Parts are length-prefixed so ("ab", "c") and ("a", "bc") differ.
pub fn content_hash<S: AsRef<str>>(parts: &[S]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        let bytes = part.as_ref().as_bytes();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    hex::encode(hasher.finalize())
}

/// Default number of food keys kept
pub const DEFAULT_CAPACITY: usize = 1024;

struct CacheEntry<T> {
    hash: String,
    value: Arc<T>,
    /// Insertion sequence, for oldest-first eviction
    seq: u64,
}

struct Entries<T> {
    map: HashMap<String, CacheEntry<T>>,
    next_seq: u64,
}

/// Thread-safe memo of the latest result per food key
pub struct AnalysisCache<T> {
    entries: Mutex<Entries<T>>,
    capacity: usize,
}

impl<T> Default for AnalysisCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AnalysisCache<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A cache holding at most `capacity` keys (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                next_seq: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries<T>> {
        // Entries are replaced whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached value for a key, if it was computed from the same inputs
    pub fn get(&self, key: &str, hash: &str) -> Option<Arc<T>> {
        self.lock()
            .map
            .get(key)
            .filter(|entry| entry.hash == hash)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Store a value, replacing whatever the key held
    pub fn insert(&self, key: &str, hash: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let mut entries = self.lock();

        if !entries.map.contains_key(key) && entries.map.len() >= self.capacity {
            let oldest = entries
                .map
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.map.remove(&oldest);
                tracing::debug!("Analysis cache full, evicted '{}'", oldest);
            }
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.map.insert(
            key.to_string(),
            CacheEntry {
                hash: hash.to_string(),
                value: Arc::clone(&value),
                seq,
            },
        );
        value
    }

    /// Return the cached value or compute and store a new one.
    ///
    /// The second element is true on a cache hit. The lock is not held while computing.
    pub fn get_or_compute<F>(&self, key: &str, hash: &str, compute: F) -> (Arc<T>, bool)
    where
        F: FnOnce() -> T,
    {
        if let Some(hit) = self.get(key, hash) {
            tracing::debug!("Analysis cache hit for '{}'", key);
            return (hit, true);
        }
        (self.insert(key, hash, compute()), false)
    }

    /// Drop the entry for a key. Returns true if one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().map.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
