use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::CacheBackend;
use crate::constants::cache::KEY_PREFIX;
use crate::db::Store;

/// Persistent fallback backend over the sqlite store.
///
/// Slower than the shared in-process cache but survives restarts. Bulk
/// clearing enumerates by key prefix, so only this cache's namespace is
/// touched.
pub struct StoreBackend {
    store: Store,
}

impl StoreBackend {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CacheBackend for StoreBackend {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.cache_repo().get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.store.cache_repo().set(key, value, ttl.as_secs()).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.cache_repo().delete(key).await
    }

    async fn clear_all(&self) -> Result<u64> {
        self.store.cache_repo().clear_prefix(KEY_PREFIX).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_and_clear() {
        let store = Store::in_memory().await.unwrap();
        let cache = StoreBackend::new(store);

        let key = format!("{KEY_PREFIX}:podcast-search:taddy:term=climate");
        cache
            .set(&key, "{\"ok\":true}", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            cache.get(&key).await.unwrap(),
            Some("{\"ok\":true}".to_string())
        );

        assert_eq!(cache.clear_all().await.unwrap(), 1);
        assert_eq!(cache.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_rows_read_as_miss() {
        let store = Store::in_memory().await.unwrap();
        let cache = StoreBackend::new(store);

        cache.set("k", "v", Duration::from_secs(0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_wholesale() {
        let store = Store::in_memory().await.unwrap();
        let cache = StoreBackend::new(store);

        cache.set("k", "old", Duration::from_secs(60)).await.unwrap();
        cache.set("k", "new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
    }
}
