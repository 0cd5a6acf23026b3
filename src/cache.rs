//! Read-through response cache.
//!
//! Cached values are keyed by (region, serialized parameters). Mutation
//! paths evict the exact regions or keys their write could have staled;
//! a failed write must leave the cache untouched, and a failed load is
//! never cached. Entries expire after a TTL and each region is bounded
//! with least-recently-used eviction.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::errors::DomainError;

/// Cache region names. A region groups every key written by one family of
/// read operations, so writers can drop a whole family at once.
pub mod regions {
    pub const USER: &str = "user";
    pub const PRODUCT: &str = "product";
    pub const PRODUCTS: &str = "products";
    pub const ORDERS: &str = "orders";
    pub const CUSTOMER_ORDERS: &str = "customer_orders";
    pub const CART: &str = "cart";
    pub const AVAILABILITY: &str = "availability";
}

/// Builds a cache key from the operation parameters.
pub fn cache_key<K: Serialize>(params: &K) -> String {
    serde_json::to_string(params).unwrap_or_else(|_| "<unserializable>".to_string())
}

#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub capacity_per_region: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            capacity_per_region: 1024,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    cached_at: Instant,
    last_accessed: Instant,
}

impl Entry {
    fn new(value: Value) -> Self {
        let now = Instant::now();
        Self {
            value,
            cached_at: now,
            last_accessed: now,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

#[derive(Debug)]
pub struct ResponseCache {
    settings: CacheSettings,
    regions: RwLock<HashMap<&'static str, HashMap<String, Entry>>>,
}

impl ResponseCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            regions: RwLock::new(HashMap::new()),
        }
    }

    /// Serves `region`/`key` from the cache, falling back to `load` on a
    /// miss. A successful load is stored; an `Err` from the loader is
    /// returned as-is and leaves the cache untouched.
    pub fn get_or_load<T, F>(
        &self,
        region: &'static str,
        key: &str,
        load: F,
    ) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, DomainError>,
    {
        if let Some(hit) = self.lookup::<T>(region, key) {
            return Ok(hit);
        }
        let value = load()?;
        self.store(region, key, &value);
        Ok(value)
    }

    fn lookup<T: DeserializeOwned>(&self, region: &'static str, key: &str) -> Option<T> {
        let mut regions = self.write_guard();
        let entries = regions.get_mut(region)?;
        let expired = match entries.get_mut(key) {
            None => return None,
            Some(entry) => {
                if entry.is_expired(self.settings.ttl) {
                    true
                } else {
                    entry.last_accessed = Instant::now();
                    return serde_json::from_value(entry.value.clone()).ok();
                }
            }
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    fn store<T: Serialize>(&self, region: &'static str, key: &str, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        let mut regions = self.write_guard();
        let entries = regions.entry(region).or_default();
        entries.retain(|_, entry| !entry.is_expired(self.settings.ttl));
        if entries.len() >= self.settings.capacity_per_region && !entries.contains_key(key) {
            if let Some(lru) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&lru);
            }
        }
        entries.insert(key.to_string(), Entry::new(value));
    }

    /// Drops every entry in `region`.
    pub fn evict_region(&self, region: &'static str) {
        let mut regions = self.write_guard();
        regions.remove(region);
    }

    /// Drops a single entry.
    pub fn evict_key(&self, region: &'static str, key: &str) {
        let mut regions = self.write_guard();
        if let Some(entries) = regions.get_mut(region) {
            entries.remove(key);
        }
    }

    fn write_guard(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<&'static str, HashMap<String, Entry>>> {
        match self.regions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(ttl_millis: u64, capacity: usize) -> ResponseCache {
        ResponseCache::new(CacheSettings {
            ttl: Duration::from_millis(ttl_millis),
            capacity_per_region: capacity,
        })
    }

    #[test]
    fn second_read_is_served_from_cache() {
        let cache = cache(60_000, 16);
        let mut loads = 0;

        for _ in 0..2 {
            let value: i64 = cache
                .get_or_load(regions::AVAILABILITY, "7", || {
                    loads += 1;
                    Ok(42)
                })
                .expect("load failed");
            assert_eq!(value, 42);
        }
        assert_eq!(loads, 1);
    }

    #[test]
    fn loader_error_is_not_cached() {
        let cache = cache(60_000, 16);

        let err: Result<i64, _> = cache.get_or_load(regions::PRODUCT, "1", || {
            Err(DomainError::not_found("missing"))
        });
        assert!(err.is_err());

        let value: i64 = cache
            .get_or_load(regions::PRODUCT, "1", || Ok(5))
            .expect("load failed");
        assert_eq!(value, 5);
    }

    #[test]
    fn expired_entries_are_reloaded() {
        let cache = cache(0, 16);
        let mut loads = 0;

        for _ in 0..2 {
            let _: i64 = cache
                .get_or_load(regions::ORDERS, "page-1", || {
                    loads += 1;
                    Ok(1)
                })
                .expect("load failed");
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(loads, 2);
    }

    #[test]
    fn region_eviction_drops_all_keys_in_region_only() {
        let cache = cache(60_000, 16);
        let _: i64 = cache.get_or_load(regions::ORDERS, "a", || Ok(1)).expect("load");
        let _: i64 = cache.get_or_load(regions::ORDERS, "b", || Ok(2)).expect("load");
        let _: i64 = cache.get_or_load(regions::CART, "c", || Ok(3)).expect("load");

        cache.evict_region(regions::ORDERS);

        let mut reloaded = 0;
        let _: i64 = cache
            .get_or_load(regions::ORDERS, "a", || {
                reloaded += 1;
                Ok(1)
            })
            .expect("load");
        let _: i64 = cache
            .get_or_load(regions::CART, "c", || {
                reloaded += 1;
                Ok(3)
            })
            .expect("load");
        assert_eq!(reloaded, 1, "only the orders region was dropped");
    }

    #[test]
    fn key_eviction_leaves_siblings_alone() {
        let cache = cache(60_000, 16);
        let _: i64 = cache.get_or_load(regions::AVAILABILITY, "1", || Ok(10)).expect("load");
        let _: i64 = cache.get_or_load(regions::AVAILABILITY, "2", || Ok(20)).expect("load");

        cache.evict_key(regions::AVAILABILITY, "1");

        let mut reloaded = 0;
        let _: i64 = cache
            .get_or_load(regions::AVAILABILITY, "1", || {
                reloaded += 1;
                Ok(10)
            })
            .expect("load");
        let _: i64 = cache
            .get_or_load(regions::AVAILABILITY, "2", || {
                reloaded += 1;
                Ok(20)
            })
            .expect("load");
        assert_eq!(reloaded, 1);
    }

    #[test]
    fn least_recently_used_entry_is_evicted_at_capacity() {
        let cache = cache(60_000, 2);
        let _: i64 = cache.get_or_load(regions::PRODUCTS, "a", || Ok(1)).expect("load");
        std::thread::sleep(Duration::from_millis(2));
        let _: i64 = cache.get_or_load(regions::PRODUCTS, "b", || Ok(2)).expect("load");
        std::thread::sleep(Duration::from_millis(2));

        // Touch "a" so "b" becomes the LRU entry.
        let _: i64 = cache.get_or_load(regions::PRODUCTS, "a", || Ok(1)).expect("load");
        std::thread::sleep(Duration::from_millis(2));
        let _: i64 = cache.get_or_load(regions::PRODUCTS, "c", || Ok(3)).expect("load");

        let mut reloaded_a = 0;
        let _: i64 = cache
            .get_or_load(regions::PRODUCTS, "a", || {
                reloaded_a += 1;
                Ok(1)
            })
            .expect("load");
        assert_eq!(reloaded_a, 0, "a survived the eviction");

        let mut reloaded_b = 0;
        let _: i64 = cache
            .get_or_load(regions::PRODUCTS, "b", || {
                reloaded_b += 1;
                Ok(2)
            })
            .expect("load");
        assert_eq!(reloaded_b, 1, "b was the least recently used entry");
    }

    #[test]
    fn cache_key_serializes_parameters() {
        assert_eq!(cache_key(&7i64), "7");
        assert_eq!(cache_key(&(1i64, 20i64)), "[1,20]");
    }
}
