pub mod listen_notes;
pub mod taddy;
pub mod youtube;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::models::{RawPayload, SearchRequest};

pub use listen_notes::ListenNotesClient;
pub use taddy::TaddyClient;
pub use youtube::YouTubeClient;

/// Identifies one upstream search provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Taddy,
    ListenNotes,
    YouTube,
}

impl ProviderId {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Taddy => "taddy",
            Self::ListenNotes => "listennotes",
            Self::YouTube => "youtube",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound query type against one external API.
///
/// Implementations construct the provider-specific query (escaping any
/// caller-supplied text against the provider's syntax), rely on the shared
/// HTTP client's timeout, clamp to the provider's own hard limits, and map
/// every failure mode to a typed [`SearchError`]. Clients are only invoked
/// after rate-limiter admission.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Executes an already-clamped request and returns the tagged raw payload.
    async fn search(&self, request: &SearchRequest) -> Result<RawPayload, SearchError>;
}

/// Build a shared HTTP client with a fixed timeout for all provider calls.
/// Reusing one client enables connection pooling and guarantees no provider
/// call can hang indefinitely.
pub fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Castarr/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}
