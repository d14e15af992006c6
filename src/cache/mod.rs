pub mod memory;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::clients::ProviderId;
use crate::constants::cache as ttl;
use crate::models::SearchChannel;

pub use memory::MemoryBackend;
pub use store::StoreBackend;

/// Key/value storage with per-entry TTL. Selected once at startup; the
/// orchestrator only ever talks to [`ResultCache`].
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Clears everything this cache is responsible for and returns how many
    /// entries went away. Backends that cannot scope the flush safely return
    /// 0 instead of clearing blindly.
    async fn clear_all(&self) -> Result<u64>;
}

/// TTL for one search channel. Catalog-ish data is cached longest, video
/// results shortest.
#[must_use]
pub fn ttl_for(channel: SearchChannel) -> Duration {
    let secs = match channel {
        SearchChannel::PodcastSearch => ttl::PODCAST_TTL_SECS,
        SearchChannel::EpisodeSearch => ttl::EPISODE_TTL_SECS,
        SearchChannel::PersonSearch => ttl::PERSON_TTL_SECS,
        SearchChannel::TitleSearch => ttl::TITLE_TTL_SECS,
        SearchChannel::VideoSearch => ttl::VIDEO_TTL_SECS,
    };
    Duration::from_secs(secs)
}

/// Deterministic cache key: namespace, channel, provider, then the sorted
/// canonical parameters. Stable across processes so the persistent backend
/// survives restarts.
#[must_use]
pub fn cache_key(
    channel: SearchChannel,
    provider: ProviderId,
    params: &[(String, String)],
) -> String {
    let mut key = format!("{}:{channel}:{provider}", ttl::KEY_PREFIX);
    for (k, v) in params {
        key.push(':');
        key.push_str(k);
        key.push('=');
        key.push_str(v);
    }
    key
}

/// Error-absorbing wrapper around the selected backend.
///
/// Cache failures never reach the caller: a failed read degrades to a miss
/// (forcing a fresh provider call), a failed write is dropped. Both are
/// logged.
#[derive(Clone)]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
}

impl ResultCache {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                metrics::counter!("castarr_cache_errors_total").increment(1);
                warn!("cache read failed, treating as miss: {e}");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if let Err(e) = self.backend.set(key, value, ttl).await {
            metrics::counter!("castarr_cache_errors_total").increment(1);
            warn!("cache write failed, entry dropped: {e}");
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            warn!("cache delete failed: {e}");
        }
    }

    pub async fn clear_all(&self) -> u64 {
        match self.backend.clear_all().await {
            Ok(count) => count,
            Err(e) => {
                warn!("cache clear failed: {e}");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchRequest;

    #[test]
    fn cache_key_is_deterministic() {
        let req = SearchRequest::new("Climate", SearchChannel::PodcastSearch);
        let a = cache_key(req.channel, ProviderId::Taddy, &req.canonical_params());
        let b = cache_key(req.channel, ProviderId::Taddy, &req.canonical_params());
        assert_eq!(a, b);
        assert!(a.starts_with("castarr:search:podcast-search:taddy:"));
    }

    #[test]
    fn different_pages_get_different_keys() {
        let mut a = SearchRequest::new("climate", SearchChannel::PodcastSearch);
        let mut b = a.clone();
        a.page = 1;
        b.page = 2;
        assert_ne!(
            cache_key(a.channel, ProviderId::Taddy, &a.canonical_params()),
            cache_key(b.channel, ProviderId::Taddy, &b.canonical_params())
        );
    }

    #[test]
    fn podcast_ttl_is_the_longest() {
        assert!(ttl_for(SearchChannel::PodcastSearch) > ttl_for(SearchChannel::EpisodeSearch));
        assert!(ttl_for(SearchChannel::EpisodeSearch) > ttl_for(SearchChannel::VideoSearch));
    }
}
