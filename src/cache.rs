//! Response cache: keyed on the question tuple, stores the raw serialized
//! response (not decoded records) so a hit is a byte copy plus an ID
//! rewrite, never a re-encode.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;

use crate::records::{RecordClass, RecordType};

fn cache_key(name: &str, qtype: RecordType, qclass: RecordClass) -> String {
    format!(
        "{}|{}|{}",
        name.to_lowercase(),
        qtype.to_u16(),
        qclass.to_u16()
    )
}

#[derive(Clone)]
struct CachedResponse {
    raw: Arc<Vec<u8>>,
    ttl: Duration,
}

struct TtlExpiry;

impl Expiry<String, CachedResponse> for TtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedResponse,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Concurrent, TTL- and cost-bounded response cache. Eviction under
/// capacity pressure is delegated entirely to moka's built-in
/// admission/eviction policy; this type only enforces the "never cache a
/// zero TTL" and "expired reads as absent" rules the rest of the forwarder
/// depends on.
pub struct ResponseCache {
    inner: Cache<String, CachedResponse>,
}

impl ResponseCache {
    pub fn new(max_cost: u64, initial_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_cost)
            .initial_capacity(initial_capacity as usize)
            .weigher(|_key, value: &CachedResponse| -> u32 {
                value.raw.len().min(u32::MAX as usize) as u32
            })
            .expire_after(TtlExpiry)
            .build();
        Self { inner }
    }

    pub async fn get(&self, name: &str, qtype: RecordType, qclass: RecordClass) -> Option<Arc<Vec<u8>>> {
        let key = cache_key(name, qtype, qclass);
        self.inner.get(&key).await.map(|entry| entry.raw)
    }

    /// Insert the raw response bytes under the question tuple. A zero TTL
    /// is never cached; this is the only admission rule this layer enforces
    /// itself, everything else is moka's policy.
    pub async fn put(&self, name: &str, qtype: RecordType, qclass: RecordClass, raw: Vec<u8>, ttl_secs: u32) {
        if ttl_secs == 0 {
            return;
        }
        let key = cache_key(name, qtype, qclass);
        self.inner
            .insert(
                key,
                CachedResponse {
                    raw: Arc::new(raw),
                    ttl: Duration::from_secs(ttl_secs as u64),
                },
            )
            .await;
    }

    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_hit() {
        let cache = ResponseCache::new(1 << 20, 100);
        cache
            .put("example.com", RecordType::A, RecordClass::IN, vec![1, 2, 3], 60)
            .await;
        let hit = cache.get("example.com", RecordType::A, RecordClass::IN).await;
        assert_eq!(hit.as_deref(), Some(&vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn miss_on_unknown_key() {
        let cache = ResponseCache::new(1 << 20, 100);
        let hit = cache.get("nowhere.example", RecordType::A, RecordClass::IN).await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn case_insensitive_name() {
        let cache = ResponseCache::new(1 << 20, 100);
        cache
            .put("Example.COM", RecordType::A, RecordClass::IN, vec![9], 60)
            .await;
        let hit = cache.get("example.com", RecordType::A, RecordClass::IN).await;
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn zero_ttl_is_never_cached() {
        let cache = ResponseCache::new(1 << 20, 100);
        cache
            .put("example.com", RecordType::A, RecordClass::IN, vec![1], 0)
            .await;
        let hit = cache.get("example.com", RecordType::A, RecordClass::IN).await;
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = ResponseCache::new(1 << 20, 100);
        cache
            .put("example.com", RecordType::A, RecordClass::IN, vec![1], 1)
            .await;
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let hit = cache.get("example.com", RecordType::A, RecordClass::IN).await;
        assert!(hit.is_none());
    }
}
