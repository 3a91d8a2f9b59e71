//! Versioned cache-aside store
//!
//! The cache is an injected capability: handlers only see the [`CacheStore`]
//! trait, so tests use the in-memory map and production could swap in a
//! distributed store. Its absence never changes correctness, only backend
//! load; every entry is advisory and bounded by its TTL.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache key format version
///
/// Part of every logical key, so a deployment that changes the payload
/// format invalidates all prior entries without explicit migration.
pub const CACHE_VERSION: &str = "v1";

/// Build a logical cache key: `{version}/{namespace}/{discriminator}`
pub fn cache_key(namespace: &str, discriminator: &str) -> String {
    format!("{}/{}/{}", CACHE_VERSION, namespace, discriminator)
}

/// A cached payload with its recording time and TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Vec<u8>,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(payload: Vec<u8>, ttl: Duration) -> Self {
        Self {
            payload,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// An entry is expired at `t >= stored_at + ttl`; it is never served then
    pub fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// Injected key-value store capability
///
/// Individual reads and writes are atomic per key; there are no cross-key
/// transactions and no single-flight collapsing of duplicate concurrent
/// misses (backend reads are idempotent, so redundant fetches are a bounded
/// inefficiency, not a hazard).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Return the live entry for `key`, or `None` on miss/expiry
    async fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Store an entry under `key`, replacing any previous one
    async fn put(&self, key: &str, entry: CacheEntry);

    /// Unconditionally remove the entry for `key`
    async fn delete(&self, key: &str);
}

/// Process-wide in-memory cache
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it so the map does not accumulate dead entries. The
        // key must be re-checked under the write lock: a concurrent put may
        // have replaced the expired entry with a live one in the meantime.
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, entry: CacheEntry) {
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn delete(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}

/// Cache-aside read: serve a hit, otherwise fetch and populate
///
/// A failed fetch propagates without storing anything (no negative
/// caching). A stored payload that no longer decodes is treated as a miss
/// and overwritten by a fresh fetch.
pub async fn get_or_fetch<T, E, F, Fut>(
    store: &dyn CacheStore,
    key: &str,
    ttl: Duration,
    fetch: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(entry) = store.get(key).await {
        match serde_json::from_slice::<T>(&entry.payload) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                return Ok(value);
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "cache payload undecodable, refetching");
            }
        }
    }

    let value = fetch().await?;

    match serde_json::to_vec(&value) {
        Ok(payload) => {
            store.put(key, CacheEntry::new(payload, ttl)).await;
        }
        Err(e) => {
            // Serve the value anyway; only the cache write is lost
            tracing::warn!(key, error = %e, "cache encode failed");
        }
    }

    Ok(value)
}
