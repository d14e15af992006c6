use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use crate::clients::{ProviderClient, ProviderId};
use crate::config::ListenNotesConfig;
use crate::constants::providers::LISTEN_NOTES_MAX_PAGE_SIZE;
use crate::error::{SearchError, transport_error};
use crate::models::{RawPayload, SearchChannel, SearchRequest, SortOrder, UNFILTERED};

/// Full-text podcast index search via the Listen Notes REST API.
///
/// Serves the person-search and title-search channels by scoping the query
/// with `only_in`.
#[derive(Clone)]
pub struct ListenNotesClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ListenNotesClient {
    #[must_use]
    pub fn new(client: Client, config: &ListenNotesConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn build_params(request: &SearchRequest) -> Vec<(String, String)> {
        // Listen Notes caps page_size at 10 regardless of tier.
        let page_size = request.page_size.min(LISTEN_NOTES_MAX_PAGE_SIZE);
        let offset = (request.page - 1) * page_size;

        let mut params = vec![
            ("q".to_string(), request.term.clone()),
            ("type".to_string(), "podcast".to_string()),
            ("offset".to_string(), offset.to_string()),
            ("page_size".to_string(), page_size.to_string()),
        ];

        let scope = match request.channel {
            SearchChannel::PersonSearch => "author",
            _ => "title",
        };
        params.push(("only_in".to_string(), scope.to_string()));

        if request.language != UNFILTERED {
            params.push(("language".to_string(), request.language.clone()));
        }
        if request.country != UNFILTERED {
            params.push(("region".to_string(), request.country.clone()));
        }
        if request.genre != UNFILTERED {
            params.push(("genre_ids".to_string(), request.genre.clone()));
        }
        if let Some(ms) = date_to_epoch_ms(&request.after_date) {
            params.push(("published_after".to_string(), ms.to_string()));
        }
        if let Some(ms) = date_to_epoch_ms(&request.before_date) {
            params.push(("published_before".to_string(), ms.to_string()));
        }
        if request.safe_mode {
            params.push(("safe_mode".to_string(), "1".to_string()));
        }
        if request.sort == SortOrder::Latest {
            params.push(("sort_by_date".to_string(), "1".to_string()));
        }

        params
    }
}

fn date_to_epoch_ms(date: &str) -> Option<i64> {
    if date.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[async_trait]
impl ProviderClient for ListenNotesClient {
    fn id(&self) -> ProviderId {
        ProviderId::ListenNotes
    }

    async fn search(&self, request: &SearchRequest) -> Result<RawPayload, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::not_configured(
                ProviderId::ListenNotes,
                "missing API key",
            ));
        }

        let url = format!("{}/search", self.endpoint);
        let params = Self::build_params(request);

        let response = self
            .client
            .get(&url)
            .header("X-ListenAPI-Key", &self.api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport_error(ProviderId::ListenNotes, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Provider {
                provider: ProviderId::ListenNotes,
                message: format!("HTTP {status}: {body}"),
                transient: status.is_server_error()
                    || status == reqwest::StatusCode::TOO_MANY_REQUESTS,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| transport_error(ProviderId::ListenNotes, &e))?;

        Ok(RawPayload::ListenNotes(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn person_search_scopes_to_author() {
        let req = SearchRequest::new("ira glass", SearchChannel::PersonSearch);
        let params = ListenNotesClient::build_params(&req);
        assert_eq!(get(&params, "only_in"), Some("author"));
    }

    #[test]
    fn title_search_scopes_to_title() {
        let req = SearchRequest::new("serial", SearchChannel::TitleSearch);
        let params = ListenNotesClient::build_params(&req);
        assert_eq!(get(&params, "only_in"), Some("title"));
    }

    #[test]
    fn page_size_is_clamped_to_provider_cap() {
        let mut req = SearchRequest::new("serial", SearchChannel::TitleSearch);
        req.page = 3;
        req.page_size = 50;
        let params = ListenNotesClient::build_params(&req);
        assert_eq!(get(&params, "page_size"), Some("10"));
        assert_eq!(get(&params, "offset"), Some("20"));
    }

    #[test]
    fn sentinel_filters_are_omitted() {
        let req = SearchRequest::new("serial", SearchChannel::TitleSearch);
        let params = ListenNotesClient::build_params(&req);
        assert_eq!(get(&params, "language"), None);
        assert_eq!(get(&params, "region"), None);
        assert_eq!(get(&params, "published_after"), None);
    }

    #[test]
    fn date_bounds_become_epoch_millis() {
        let mut req = SearchRequest::new("serial", SearchChannel::TitleSearch);
        req.after_date = "2024-01-01".to_string();
        let params = ListenNotesClient::build_params(&req);
        assert_eq!(get(&params, "published_after"), Some("1704067200000"));
    }
}
