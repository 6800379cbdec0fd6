//! Time-to-live cache for backend responses.
//!
//! Entries expire a fixed `ttl` after insertion. Expired entries are
//! invisible to readers immediately and physically removed by
//! [`ExpiringCache::purge_expired`], which the server runs periodically.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Concurrent string cache with per-entry expiry.
#[derive(Debug)]
pub struct ExpiringCache {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl ExpiringCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        self.entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.value.clone())
    }

    /// Cached value for `key`, computing and storing it on a miss. The
    /// boolean is true on a hit.
    pub fn get_or_insert_with(&self, key: &str, make: impl FnOnce() -> String) -> (String, bool) {
        self.get_or_insert_at(key, Instant::now(), make)
    }

    fn get_or_insert_at(
        &self,
        key: &str,
        now: Instant,
        make: impl FnOnce() -> String,
    ) -> (String, bool) {
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: String::new(),
            expires_at: now,
        });
        if entry.expires_at > now {
            return (entry.value.clone(), true);
        }
        let value = make();
        *entry = Entry {
            value: value.clone(),
            expires_at: now + self.ttl,
        };
        (value, false)
    }

    /// Remove every expired entry; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, e| {
            let live = e.expires_at > now;
            if !live {
                debug!(key, value = %e.value, "removed cached key");
            }
            live
        });
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run [`purge_expired`](Self::purge_expired) every `every` until the
    /// returned task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                cache.purge_expired();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let cache = ExpiringCache::new(Duration::from_secs(10));
        let (v, hit) = cache.get_or_insert_with("k", || "hello: k".to_string());
        assert_eq!((v.as_str(), hit), ("hello: k", false));

        let (v, hit) = cache.get_or_insert_with("k", || unreachable!());
        assert_eq!((v.as_str(), hit), ("hello: k", true));
        assert_eq!(cache.get("k").as_deref(), Some("hello: k"));
    }

    #[test]
    fn test_entries_expire() {
        let cache = ExpiringCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.get_or_insert_at("k", t0, || "v1".to_string());

        assert!(cache.get_at("k", t0 + Duration::from_secs(9)).is_some());
        assert!(cache.get_at("k", t0 + Duration::from_secs(10)).is_none());

        let later = t0 + Duration::from_secs(11);
        let (v, hit) = cache.get_or_insert_at("k", later, || "v2".to_string());
        assert_eq!((v.as_str(), hit), ("v2", false));
    }

    #[test]
    fn test_purge_expired() {
        let cache = ExpiringCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.get_or_insert_at("old", t0, || "a".to_string());
        cache.get_or_insert_at("new", t0 + Duration::from_secs(5), || "b".to_string());

        assert_eq!(cache.purge_expired_at(t0 + Duration::from_secs(12)), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_at("new", t0 + Duration::from_secs(12)).is_some());
    }

    #[tokio::test]
    async fn test_sweeper_evicts() {
        let cache = Arc::new(ExpiringCache::new(Duration::from_millis(50)));
        cache.get_or_insert_with("k", || "v".to_string());
        let sweeper = cache.spawn_sweeper(Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(200)).await;
        sweeper.abort();
        assert!(cache.is_empty());
    }
}
