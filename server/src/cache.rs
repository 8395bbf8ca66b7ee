use std::time::{Duration, Instant};

use dashmap::DashMap;
use podbridge_api::Podcast;

struct Entry<T> {
    value: T,
    inserted_at: Instant,
}

/// TTL-bounded in-memory map (§4.5), generic so the same shape serves both
/// the podcast cache (keyed by feed fingerprint) and the smaller
/// default-view cache (keyed by username). Backed by `DashMap` for
/// lock-free concurrent reads/writes, the same way the task tracker keeps
/// per-key state sharded.
pub struct TtlCache<T> {
    ttl: Duration,
    entries: DashMap<String, Entry<T>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Returns the cached value if present and still fresh; otherwise
    /// evicts it (if present) and returns `None`.
    pub fn get(&self, key: &str) -> Option<T> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }
        self.entries.remove(key);
        None
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts `value` under `key` and piggybacks a scrub of every expired
    /// entry, matching the source's "insert may evict stale entries"
    /// behavior (§4.5).
    pub fn insert(&self, key: String, value: T) {
        self.entries.insert(key, Entry { value, inserted_at: Instant::now() });
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.inserted_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub type PodcastCache = TtlCache<Podcast>;
/// Caches the resolved `MusicType` name for a username's default view.
pub type DefaultViewCache = TtlCache<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_insert_then_hit() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        assert!(cache.get("k").is_none());
        cache.insert("k".to_string(), 42);
        assert_eq!(cache.get("k"), Some(42));
    }

    #[test]
    fn expired_entry_is_a_miss_and_is_evicted() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(1));
        cache.insert("k".to_string(), 1);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.contains("k"));
        assert_eq!(cache.len(), 0);
    }
}
