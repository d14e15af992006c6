use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{CacheBackend, MemoryBackend, ResultCache, StoreBackend};
use crate::clients::{
    ListenNotesClient, ProviderClient, ProviderId, TaddyClient, YouTubeClient,
    build_shared_http_client,
};
use crate::config::Config;
use crate::db::Store;
use crate::ratelimit::{RateLimiter, WindowConfig};
use crate::services::{SearchService, SponsoredService};
use crate::tier::TierPolicy;

/// Everything the search core needs, assembled once and passed by handle.
/// There are no process-global lookups; every consumer receives its
/// collaborators here.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub search_service: Arc<SearchService>,

    pub sponsored_service: Arc<SponsoredService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        // One HTTP client for all providers: pooling plus a hard timeout so
        // no provider call can hang a request forever.
        let http_client = build_shared_http_client(config.general.request_timeout_seconds)?;

        let clients: Vec<Arc<dyn ProviderClient>> = vec![
            Arc::new(TaddyClient::new(http_client.clone(), &config.taddy)),
            Arc::new(ListenNotesClient::new(
                http_client.clone(),
                &config.listen_notes,
            )),
            Arc::new(YouTubeClient::new(http_client, &config.youtube)),
        ];

        let limiter = RateLimiter::new(rate_windows(&config));
        let cache = ResultCache::new(select_cache_backend(&config, &store));
        info!(backend = cache.backend_name(), "result cache ready");

        let policy = TierPolicy::from_config(&config.tiers);
        let search_service = Arc::new(SearchService::new(policy, cache, limiter, clients));
        let sponsored_service = Arc::new(SponsoredService::from_store(&store));

        Ok(Self {
            config: Arc::new(config),
            store,
            search_service,
            sponsored_service,
        })
    }
}

fn rate_windows(config: &Config) -> HashMap<ProviderId, WindowConfig> {
    let to_window = |s: crate::config::WindowSettings| WindowConfig {
        capacity: s.max_requests,
        window: Duration::from_secs(s.window_seconds),
    };

    HashMap::from([
        (ProviderId::Taddy, to_window(config.rate_limits.taddy)),
        (
            ProviderId::ListenNotes,
            to_window(config.rate_limits.listen_notes),
        ),
        (ProviderId::YouTube, to_window(config.rate_limits.youtube)),
    ])
}

/// Backend choice is made exactly once, here, and never re-evaluated per
/// call. `auto` prefers the shared in-process cache when its group may be
/// flushed (so an operator can still clear it), otherwise falls back to the
/// persistent store.
fn select_cache_backend(config: &Config, store: &Store) -> Arc<dyn CacheBackend> {
    match config.cache.backend.as_str() {
        "shared" => Arc::new(MemoryBackend::new(
            config.cache.group.clone(),
            config.cache.group_flush,
        )),
        "persistent" => Arc::new(StoreBackend::new(store.clone())),
        _ => {
            if config.cache.group_flush {
                Arc::new(MemoryBackend::new(config.cache.group.clone(), true))
            } else {
                Arc::new(StoreBackend::new(store.clone()))
            }
        }
    }
}
