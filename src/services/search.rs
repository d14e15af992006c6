use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{ResultCache, cache_key, ttl_for};
use crate::clients::{ProviderClient, ProviderId};
use crate::error::SearchError;
use crate::models::{RawPayload, SearchChannel, SearchRequest, SearchResultEnvelope};
use crate::ratelimit::RateLimiter;
use crate::tier::TierPolicy;

/// Central search orchestrator.
///
/// Per request: validate, clamp against the caller's tier, consult the cache,
/// and only on a miss spend a rate-limit slot on exactly one provider call.
/// Successful payloads are written through with the channel's TTL; failures
/// are never cached. Every outcome, success or failure, is returned as a
/// [`SearchResultEnvelope`].
pub struct SearchService {
    policy: TierPolicy,
    cache: ResultCache,
    limiter: RateLimiter,
    providers: HashMap<ProviderId, Arc<dyn ProviderClient>>,
}

impl SearchService {
    #[must_use]
    pub fn new(
        policy: TierPolicy,
        cache: ResultCache,
        limiter: RateLimiter,
        clients: Vec<Arc<dyn ProviderClient>>,
    ) -> Self {
        let providers = clients.into_iter().map(|c| (c.id(), c)).collect();
        Self {
            policy,
            cache,
            limiter,
            providers,
        }
    }

    /// Clamps a request against a tier without running it. Usable standalone
    /// by validation layers.
    #[must_use]
    pub fn clamp_request(&self, request: &SearchRequest, tier: &str) -> SearchRequest {
        self.policy.clamp_request(request, tier)
    }

    pub async fn search(&self, request: &SearchRequest, tier: &str) -> SearchResultEnvelope {
        match self.search_inner(request, tier).await {
            Ok(envelope) => envelope,
            Err(err) => {
                metrics::counter!("castarr_search_failures_total", "kind" => err.kind())
                    .increment(1);
                SearchResultEnvelope::failure(request.channel, &err)
            }
        }
    }

    async fn search_inner(
        &self,
        request: &SearchRequest,
        tier: &str,
    ) -> Result<SearchResultEnvelope, SearchError> {
        request.validate()?;

        let clamped = self.policy.clamp_request(request, tier);
        let provider = clamped.channel.provider();
        let key = cache_key(clamped.channel, provider, &clamped.canonical_params());

        if let Some(payload) = self.cached_payload(&key).await {
            metrics::counter!("castarr_cache_hits_total").increment(1);
            debug!(%provider, channel = %clamped.channel, "cache hit");
            return Ok(SearchResultEnvelope::success(clamped.channel, payload, true));
        }
        metrics::counter!("castarr_cache_misses_total").increment(1);

        if !self.limiter.admit(provider) {
            let retry_after = self.limiter.retry_after(provider);
            metrics::counter!("castarr_rate_limited_total", "provider" => provider.as_str())
                .increment(1);
            return Err(SearchError::RateLimited {
                provider,
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        let client = self.providers.get(&provider).ok_or_else(|| {
            SearchError::not_configured(provider, "no client registered for this provider")
        })?;

        self.limiter.record(provider);
        info!(%provider, channel = %clamped.channel, term = %clamped.term, "provider search");
        metrics::counter!("castarr_provider_calls_total", "provider" => provider.as_str())
            .increment(1);

        let payload = client.search(&clamped).await?;

        match serde_json::to_string(&payload) {
            Ok(serialized) => {
                self.cache
                    .set(&key, &serialized, ttl_for(clamped.channel))
                    .await;
            }
            Err(e) => warn!("payload not serializable, skipping cache write: {e}"),
        }

        Ok(SearchResultEnvelope::success(clamped.channel, payload, false))
    }

    /// Reads and deserializes a cached payload. A corrupt entry is deleted
    /// and treated as a miss rather than surfaced.
    async fn cached_payload(&self, key: &str) -> Option<RawPayload> {
        let raw = self.cache.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("corrupt cache entry for {key}, dropping: {e}");
                self.cache.delete(key).await;
                None
            }
        }
    }

    /// Best-effort diagnostic mode: runs `term` through one channel per
    /// provider concurrently and returns every envelope, failures included.
    /// This is the only place partial multi-provider results exist; `search`
    /// never falls back across providers.
    pub async fn search_all(&self, term: &str, tier: &str) -> Vec<SearchResultEnvelope> {
        let channels = [
            SearchChannel::PodcastSearch,
            SearchChannel::TitleSearch,
            SearchChannel::VideoSearch,
        ];

        let futures = channels.map(|channel| {
            let request = SearchRequest::new(term, channel);
            async move { self.search(&request, tier).await }
        });

        futures::future::join_all(futures).await
    }

    /// Flushes every cached result this process is responsible for.
    pub async fn clear_all_caches(&self) -> u64 {
        let cleared = self.cache.clear_all().await;
        info!(cleared, backend = self.cache.backend_name(), "cache cleared");
        cleared
    }
}
