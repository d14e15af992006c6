use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CacheBackend;

#[derive(Debug, Clone)]
pub struct Entry {
    value: String,
    expires_at: Instant,
}

/// Map that several [`MemoryBackend`] instances may share within a process.
pub type SharedMap = Arc<RwLock<HashMap<String, Entry>>>;

/// Shared in-process cache backend.
///
/// The map may be shared between several constructions (the process-wide
/// object cache), so every key is namespaced with this instance's group.
/// `clear_all` only flushes the group, and only when group flush is enabled;
/// blind flushing of a map other tenants write to is refused.
pub struct MemoryBackend {
    map: SharedMap,
    group: String,
    group_flush: bool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(group: impl Into<String>, group_flush: bool) -> Self {
        Self {
            map: Arc::new(RwLock::new(HashMap::new())),
            group: group.into(),
            group_flush,
        }
    }

    /// Attach to an existing shared map instead of owning one.
    #[must_use]
    pub fn with_shared_map(map: SharedMap, group: impl Into<String>, group_flush: bool) -> Self {
        Self {
            map,
            group: group.into(),
            group_flush,
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{key}", self.group)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = self.namespaced(key);
        let now = Instant::now();

        {
            let map = self.map.read().await;
            match map.get(&key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it so the map does not accumulate dead entries.
        self.map.write().await.remove(&key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let key = self.namespaced(key);
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.map.write().await.insert(key, entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = self.namespaced(key);
        self.map.write().await.remove(&key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<u64> {
        if !self.group_flush {
            return Ok(0);
        }
        let prefix = format!("{}:", self.group);
        let mut map = self.map.write().await;
        let before = map.len();
        map.retain(|k, _| !k.starts_with(&prefix));
        Ok((before - map.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip() {
        let cache = MemoryBackend::new("t", true);
        cache
            .set("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = MemoryBackend::new("t", true);
        cache
            .set("k", "v", Duration::from_millis(30))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_all_flushes_only_own_group() {
        let map: SharedMap = Arc::new(RwLock::new(HashMap::new()));
        let ours = MemoryBackend::with_shared_map(map.clone(), "castarr", true);
        let theirs = MemoryBackend::with_shared_map(map, "other-tenant", true);

        ours.set("a", "1", Duration::from_secs(60)).await.unwrap();
        ours.set("b", "2", Duration::from_secs(60)).await.unwrap();
        theirs.set("c", "3", Duration::from_secs(60)).await.unwrap();

        assert_eq!(ours.clear_all().await.unwrap(), 2);
        assert_eq!(ours.get("a").await.unwrap(), None);
        assert_eq!(theirs.get("c").await.unwrap(), Some("3".to_string()));
    }

    #[tokio::test]
    async fn clear_all_without_group_flush_is_a_noop() {
        let cache = MemoryBackend::new("t", false);
        cache
            .set("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.clear_all().await.unwrap(), 0);
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache = MemoryBackend::new("t", true);
        cache
            .set("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
