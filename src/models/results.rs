use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::ProviderId;
use crate::error::SearchError;
use crate::models::request::SearchChannel;

/// A raw provider payload, tagged with its origin at the point of dispatch.
///
/// The tag travels with the payload through cache serialization so the
/// normalizer can pattern-match instead of probing nested keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", content = "data", rename_all = "lowercase")]
pub enum RawPayload {
    Taddy(Value),
    ListenNotes(Value),
    YouTube(Value),
}

impl RawPayload {
    #[must_use]
    pub const fn provider(&self) -> ProviderId {
        match self {
            Self::Taddy(_) => ProviderId::Taddy,
            Self::ListenNotes(_) => ProviderId::ListenNotes,
            Self::YouTube(_) => ProviderId::YouTube,
        }
    }

    /// Number of result items in the payload, zero for anything malformed.
    #[must_use]
    pub fn item_count(&self) -> usize {
        let items = match self {
            Self::Taddy(v) => v
                .pointer("/data/searchForTerm/podcastSeries")
                .or_else(|| v.pointer("/data/searchForTerm/podcastEpisodes")),
            Self::ListenNotes(v) => v.get("results"),
            Self::YouTube(v) => v.get("items"),
        };
        items.and_then(Value::as_array).map_or(0, Vec::len)
    }
}

/// Uniform per-request outcome returned by the orchestrator. Created fresh
/// per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultEnvelope {
    pub success: bool,

    pub channel: SearchChannel,

    pub provider: ProviderId,

    pub from_cache: bool,

    pub count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<RawPayload>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    /// Suggested wait before retrying, only set for rate-limit denials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl SearchResultEnvelope {
    #[must_use]
    pub fn success(channel: SearchChannel, payload: RawPayload, from_cache: bool) -> Self {
        Self {
            success: true,
            channel,
            provider: payload.provider(),
            from_cache,
            count: payload.item_count(),
            payload: Some(payload),
            error: None,
            error_kind: None,
            retry_after_secs: None,
        }
    }

    #[must_use]
    pub fn failure(channel: SearchChannel, err: &SearchError) -> Self {
        let retry_after_secs = match err {
            SearchError::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };
        Self {
            success: false,
            channel,
            provider: channel.provider(),
            from_cache: false,
            count: 0,
            payload: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind().to_string()),
            retry_after_secs,
        }
    }
}

/// Display-oriented shape shared by all three providers after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub title: String,

    pub artwork_url: String,

    pub description: String,

    pub publisher: String,

    pub explicit: bool,

    pub categories: Vec<String>,

    /// Stable feed URL, preserved verbatim for downstream deduplication.
    pub feed_url: String,

    /// Provider-assigned numeric id, verbatim, empty if absent.
    pub provider_ref: String,

    /// Provider-assigned UUID, verbatim, empty if absent.
    pub uuid: String,

    /// Present only for episode-level results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<EpisodeDetails>,
}

impl NormalizedItem {
    /// An item with every field at its neutral value. Normalizers fill in
    /// whatever the payload actually carries.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            artwork_url: String::new(),
            description: String::new(),
            publisher: String::new(),
            explicit: false,
            categories: Vec::new(),
            feed_url: String::new(),
            provider_ref: String::new(),
            uuid: String::new(),
            episode: None,
        }
    }

    /// True when the item carries at least one identifier usable for
    /// deduplication downstream.
    #[must_use]
    pub fn has_identifier(&self) -> bool {
        !self.feed_url.is_empty() || !self.provider_ref.is_empty() || !self.uuid.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeDetails {
    pub title: String,

    /// RFC 3339 publish timestamp, empty if the provider omitted it.
    pub published: String,

    pub duration_secs: u64,
}
