//! DNS response cache with TTL-based expiration.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

struct CacheEntry {
    response: Vec<u8>,
    expires_at: Instant,
    seq: u64,
}

#[derive(Default)]
struct Entries {
    map: FxHashMap<String, CacheEntry>,
    /// Insertion sequence -> key, oldest first.
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl Entries {
    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.map.remove(key) {
            self.order.remove(&entry.seq);
        }
    }
}

/// Snapshot of cache occupancy and effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hits as a rounded percentage of all lookups.
    pub hit_rate: u64,
}

/// Bounded TTL cache of encoded responses keyed by `name:type`.
///
/// When full, the oldest *inserted* entry is evicted; reads do not refresh an
/// entry's position. Expired entries are dropped lazily when read.
pub struct DnsCache {
    entries: Mutex<Entries>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DnsCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a cached response.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();

        let found = {
            let Ok(mut entries) = self.entries.lock() else {
                return None;
            };
            match entries.map.get(key).map(|entry| now > entry.expires_at) {
                Some(true) => {
                    entries.remove(key);
                    None
                }
                Some(false) => entries.map.get(key).map(|entry| entry.response.clone()),
                None => None,
            }
        };

        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a response for `ttl`. Overwriting a key keeps its original
    /// insertion position.
    pub fn set(&self, key: &str, response: Vec<u8>, ttl: Duration) {
        if self.capacity == 0 {
            return;
        }

        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        if entries.map.len() >= self.capacity {
            if let Some((_, oldest)) = entries.order.pop_first() {
                entries.map.remove(&oldest);
            }
        }

        let expires_at = Instant::now() + ttl;
        if let Some(entry) = entries.map.get_mut(key) {
            entry.response = response;
            entry.expires_at = expires_at;
            return;
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.order.insert(seq, key.to_string());
        entries.map.insert(
            key.to_string(),
            CacheEntry {
                response,
                expires_at,
                seq,
            },
        );
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.map.clear();
            entries.order.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64 * 100.0).round() as u64
        } else {
            0
        };

        CacheStats {
            size: self.len(),
            capacity: self.capacity,
            hits,
            misses,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn get_returns_stored_value() {
        let cache = DnsCache::new(10);
        cache.set("example.com:1", vec![1, 2, 3], Duration::from_secs(1));

        assert_eq!(cache.get("example.com:1"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn expired_entry_is_removed_on_read() {
        let cache = DnsCache::new(10);
        cache.set("example.com:1", vec![1], Duration::from_secs(1));
        assert_eq!(cache.get("example.com:1"), Some(vec![1]));

        std::thread::sleep(Duration::from_millis(1100));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("example.com:1"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn evicts_first_inserted_even_after_read() {
        let cache = DnsCache::new(3);
        cache.set("a", vec![1], MINUTE);
        cache.set("b", vec![2], MINUTE);
        cache.set("c", vec![3], MINUTE);
        assert!(cache.get("a").is_some());

        cache.set("d", vec![4], MINUTE);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), None);
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn overwrite_keeps_insertion_position() {
        let cache = DnsCache::new(2);
        cache.set("a", vec![1], MINUTE);
        cache.set("b", vec![2], MINUTE);
        // at capacity: "a" is evicted before "b" is overwritten in place
        cache.set("b", vec![20], MINUTE);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(vec![20]));

        cache.set("c", vec![3], MINUTE);
        // "b" is still the oldest insertion
        cache.set("d", vec![4], MINUTE);

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(vec![3]));
        assert_eq!(cache.get("d"), Some(vec![4]));
    }

    #[test]
    fn overwrite_below_capacity_replaces_value() {
        let cache = DnsCache::new(5);
        cache.set("a", vec![1], MINUTE);
        cache.set("a", vec![9], MINUTE);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(vec![9]));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = DnsCache::new(0);
        cache.set("a", vec![1], MINUTE);

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let cache = DnsCache::new(10);
        assert_eq!(cache.stats().hit_rate, 0);

        cache.set("a", vec![1], MINUTE);
        cache.get("a");
        cache.get("a");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 67);
    }

    #[test]
    fn clear_resets_entries_and_counters() {
        let cache = DnsCache::new(10);
        cache.set("a", vec![1], MINUTE);
        cache.get("a");
        cache.get("b");

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }
}
