use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() > at)
    }
}

/// Process-local TTL cache for read-heavy public responses (course list).
/// Values are stored JSON-serialized; expired entries are dropped on read.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    store: DashMap<String, CacheEntry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.store.get(key)?;
        if entry.is_expired() {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        serde_json::from_str(&entry.value).ok()
    }

    pub fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value)?;
        self.store
            .insert(key.to_string(), CacheEntry::new(serialized, ttl));
        Ok(())
    }

    pub fn invalidate(&self, key: &str) {
        self.store.remove(key);
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let cache = InMemoryCache::new();
        cache.set("k", &vec![1u32, 2, 3], None).unwrap();
        assert_eq!(cache.get::<Vec<u32>>("k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn missing_key_is_none() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get::<String>("absent"), None);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = InMemoryCache::new();
        cache
            .set("k", &"v".to_string(), Some(Duration::from_nanos(1)))
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get::<String>("k"), None);
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = InMemoryCache::new();
        cache.set("k", &1u8, None).unwrap();
        cache.invalidate("k");
        assert_eq!(cache.get::<u8>("k"), None);
    }
}
