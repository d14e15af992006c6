use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::clients::{ProviderClient, ProviderId};
use crate::config::YouTubeConfig;
use crate::constants::providers::YOUTUBE_MAX_RESULTS;
use crate::error::{SearchError, transport_error};
use crate::models::{RawPayload, SearchRequest, SortOrder, UNFILTERED};

/// Video search via the YouTube Data API v3.
///
/// The API pages by opaque token rather than page number, so the client
/// always fetches the first window of up to `maxResults`; the page number
/// still participates in clamping and the cache key upstream.
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl YouTubeClient {
    #[must_use]
    pub fn new(client: Client, config: &YouTubeConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn build_params(&self, request: &SearchRequest) -> Vec<(String, String)> {
        let max_results = request.page_size.min(YOUTUBE_MAX_RESULTS);

        let mut params = vec![
            ("key".to_string(), self.api_key.clone()),
            ("part".to_string(), "snippet".to_string()),
            ("type".to_string(), "video".to_string()),
            ("q".to_string(), request.term.clone()),
            ("maxResults".to_string(), max_results.to_string()),
        ];

        params.push((
            "safeSearch".to_string(),
            if request.safe_mode { "strict" } else { "none" }.to_string(),
        ));
        params.push((
            "order".to_string(),
            match request.sort {
                SortOrder::Latest | SortOrder::Oldest => "date",
                SortOrder::BestMatch => "relevance",
            }
            .to_string(),
        ));

        if request.language != UNFILTERED {
            params.push(("relevanceLanguage".to_string(), request.language.clone()));
        }
        if request.country != UNFILTERED {
            params.push(("regionCode".to_string(), request.country.clone()));
        }
        if !request.after_date.is_empty() {
            params.push((
                "publishedAfter".to_string(),
                format!("{}T00:00:00Z", request.after_date),
            ));
        }
        if !request.before_date.is_empty() {
            params.push((
                "publishedBefore".to_string(),
                format!("{}T23:59:59Z", request.before_date),
            ));
        }

        params
    }
}

#[async_trait]
impl ProviderClient for YouTubeClient {
    fn id(&self) -> ProviderId {
        ProviderId::YouTube
    }

    async fn search(&self, request: &SearchRequest) -> Result<RawPayload, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::not_configured(
                ProviderId::YouTube,
                "missing API key",
            ));
        }

        let url = format!("{}/search", self.endpoint);
        let params = self.build_params(request);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport_error(ProviderId::YouTube, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Provider {
                provider: ProviderId::YouTube,
                message: format!("HTTP {status}: {body}"),
                transient: status.is_server_error()
                    || status == reqwest::StatusCode::TOO_MANY_REQUESTS,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| transport_error(ProviderId::YouTube, &e))?;

        // The API can report quota errors with a 200 on some surfaces.
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return Err(SearchError::provider_permanent(
                ProviderId::YouTube,
                message.to_string(),
            ));
        }

        Ok(RawPayload::YouTube(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchChannel;

    fn client() -> YouTubeClient {
        YouTubeClient::new(
            Client::new(),
            &YouTubeConfig {
                api_key: "test-key".to_string(),
                endpoint: "https://example.invalid".to_string(),
            },
        )
    }

    fn get<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn safe_mode_maps_to_strict() {
        let mut req = SearchRequest::new("lofi", SearchChannel::VideoSearch);
        req.safe_mode = true;
        let params = client().build_params(&req);
        assert_eq!(get(&params, "safeSearch"), Some("strict"));
    }

    #[test]
    fn max_results_clamped_to_provider_cap() {
        let mut req = SearchRequest::new("lofi", SearchChannel::VideoSearch);
        req.page_size = 500;
        let params = client().build_params(&req);
        assert_eq!(get(&params, "maxResults"), Some("50"));
    }

    #[test]
    fn latest_sort_maps_to_date_order() {
        let mut req = SearchRequest::new("lofi", SearchChannel::VideoSearch);
        req.sort = SortOrder::Latest;
        let params = client().build_params(&req);
        assert_eq!(get(&params, "order"), Some("date"));
    }

    #[test]
    fn date_bounds_become_rfc3339() {
        let mut req = SearchRequest::new("lofi", SearchChannel::VideoSearch);
        req.after_date = "2024-01-01".to_string();
        let params = client().build_params(&req);
        assert_eq!(get(&params, "publishedAfter"), Some("2024-01-01T00:00:00Z"));
    }
}
