use thiserror::Error;

use crate::clients::ProviderId;

/// Errors produced by the search core.
///
/// `Cache` never crosses the service boundary: cache failures degrade to a
/// miss so a fresh provider call is made instead.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{provider} rate limit reached, retry in {retry_after_secs}s")]
    RateLimited {
        provider: ProviderId,
        retry_after_secs: u64,
    },

    #[error("{provider} error: {message}")]
    Provider {
        provider: ProviderId,
        message: String,
        transient: bool,
    },

    #[error("{provider} is not configured: {message}")]
    NotConfigured {
        provider: ProviderId,
        message: String,
    },

    #[error("cache error: {0}")]
    Cache(String),
}

impl SearchError {
    /// Stable machine-readable tag carried on result envelopes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::RateLimited { .. } => "rate_limited",
            Self::Provider { .. } => "provider_error",
            Self::NotConfigured { .. } => "not_configured",
            Self::Cache(_) => "cache",
        }
    }

    /// Whether retrying the same request later could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Cache(_) => true,
            Self::Provider { transient, .. } => *transient,
            Self::Validation(_) | Self::NotConfigured { .. } => false,
        }
    }

    pub fn provider_transient(provider: ProviderId, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: msg.into(),
            transient: true,
        }
    }

    pub fn provider_permanent(provider: ProviderId, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: msg.into(),
            transient: false,
        }
    }

    pub fn not_configured(provider: ProviderId, msg: impl Into<String>) -> Self {
        Self::NotConfigured {
            provider,
            message: msg.into(),
        }
    }
}

/// Maps a transport failure to a provider error for the given provider.
/// Timeouts and connection failures are worth retrying later; everything
/// else (bad TLS, malformed body) usually is not.
pub fn transport_error(provider: ProviderId, err: &reqwest::Error) -> SearchError {
    SearchError::Provider {
        provider,
        message: err.to_string(),
        transient: err.is_timeout() || err.is_connect(),
    }
}
