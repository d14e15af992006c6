use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::clients::{ProviderClient, ProviderId};
use crate::config::TaddyConfig;
use crate::constants::providers::TADDY_MAX_PAGE_SIZE;
use crate::error::{SearchError, transport_error};
use crate::models::{RawPayload, SearchChannel, SearchRequest, SortOrder, UNFILTERED};

#[derive(Serialize)]
struct GraphQLRequest {
    query: String,
}

/// Structured podcast metadata via the Taddy GraphQL API.
///
/// Taddy serves the podcast-series and podcast-episode channels. The search
/// term and filter values are interpolated into the query document, so every
/// caller-supplied string goes through [`escape_term`] first.
#[derive(Clone)]
pub struct TaddyClient {
    client: Client,
    endpoint: String,
    api_key: String,
    user_id: String,
}

impl TaddyClient {
    #[must_use]
    pub fn new(client: Client, config: &TaddyConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            user_id: config.user_id.clone(),
        }
    }

    fn ensure_configured(&self) -> Result<(), SearchError> {
        if self.api_key.is_empty() || self.user_id.is_empty() {
            return Err(SearchError::not_configured(
                ProviderId::Taddy,
                "missing API key or user id",
            ));
        }
        Ok(())
    }

    fn build_query(request: &SearchRequest) -> String {
        let entity = match request.channel {
            SearchChannel::EpisodeSearch => "PODCASTEPISODE",
            _ => "PODCASTSERIES",
        };
        let results_field = match request.channel {
            SearchChannel::EpisodeSearch => {
                "podcastEpisodes { \
                 uuid name description audioUrl datePublished duration \
                 podcastSeries { uuid name rssUrl imageUrl itunesId } }"
            }
            _ => {
                "podcastSeries { \
                 uuid name description rssUrl imageUrl itunesId authorName \
                 isExplicitContent genres }"
            }
        };

        // Taddy's own paging cap is stricter than any tier limit.
        let page_size = request.page_size.min(TADDY_MAX_PAGE_SIZE);

        let mut args = vec![
            format!("term: \"{}\"", escape_term(&request.term)),
            format!("filterForTypes: {entity}"),
            format!("page: {}", request.page),
            format!("limitPerPage: {page_size}"),
        ];

        if request.language != UNFILTERED {
            args.push(format!(
                "filterForLanguages: \"{}\"",
                escape_term(&request.language)
            ));
        }
        if request.genre != UNFILTERED {
            args.push(format!(
                "filterForGenres: \"{}\"",
                escape_term(&request.genre)
            ));
        }
        if request.channel == SearchChannel::EpisodeSearch {
            if !request.after_date.is_empty() {
                args.push(format!(
                    "filterForPublishedAfter: \"{}\"",
                    escape_term(&request.after_date)
                ));
            }
            if !request.before_date.is_empty() {
                args.push(format!(
                    "filterForPublishedBefore: \"{}\"",
                    escape_term(&request.before_date)
                ));
            }
        }
        if request.safe_mode {
            args.push("isSafeMode: true".to_string());
        }
        match request.sort {
            SortOrder::Latest => args.push("sortBy: LATEST".to_string()),
            SortOrder::Oldest => args.push("sortBy: OLDEST".to_string()),
            SortOrder::BestMatch => {}
        }

        format!(
            "{{ searchForTerm({}) {{ searchId {} }} }}",
            args.join(", "),
            results_field
        )
    }
}

#[async_trait]
impl ProviderClient for TaddyClient {
    fn id(&self) -> ProviderId {
        ProviderId::Taddy
    }

    async fn search(&self, request: &SearchRequest) -> Result<RawPayload, SearchError> {
        self.ensure_configured()?;

        let body = GraphQLRequest {
            query: Self::build_query(request),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header("X-USER-ID", &self.user_id)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(ProviderId::Taddy, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Provider {
                provider: ProviderId::Taddy,
                message: format!("HTTP {status}: {body}"),
                transient: status.is_server_error(),
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| transport_error(ProviderId::Taddy, &e))?;

        // GraphQL reports application errors on a 200.
        if let Some(errors) = value.get("errors").and_then(Value::as_array)
            && !errors.is_empty()
        {
            let message = errors[0]
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified GraphQL error")
                .to_string();
            return Err(SearchError::provider_permanent(ProviderId::Taddy, message));
        }

        Ok(RawPayload::Taddy(value))
    }
}

/// Escapes a caller-supplied string for interpolation inside a GraphQL
/// string literal. Quotes, backslashes, and control whitespace would
/// otherwise break out of the literal.
#[must_use]
pub fn escape_term(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_term(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_term(r"a\b"), r"a\\b");
    }

    #[test]
    fn escapes_control_whitespace() {
        assert_eq!(escape_term("a\nb\tc\rd"), "a\\nb\\tc\\rd");
    }

    #[test]
    fn plain_terms_pass_through() {
        assert_eq!(escape_term("climate change"), "climate change");
    }

    #[test]
    fn query_contains_escaped_term_and_clamped_page_size() {
        let mut req = SearchRequest::new(r#"pod"cast"#, SearchChannel::PodcastSearch);
        req.page_size = 100;
        let q = TaddyClient::build_query(&req);
        assert!(q.contains(r#"term: "pod\"cast""#));
        assert!(q.contains("limitPerPage: 25"));
        assert!(q.contains("filterForTypes: PODCASTSERIES"));
    }

    #[test]
    fn episode_search_carries_date_bounds() {
        let mut req = SearchRequest::new("climate", SearchChannel::EpisodeSearch);
        req.after_date = "2024-01-01".to_string();
        let q = TaddyClient::build_query(&req);
        assert!(q.contains("PODCASTEPISODE"));
        assert!(q.contains(r#"filterForPublishedAfter: "2024-01-01""#));
    }

    #[test]
    fn unfiltered_sentinels_emit_no_filters() {
        let req = SearchRequest::new("climate", SearchChannel::PodcastSearch);
        let q = TaddyClient::build_query(&req);
        assert!(!q.contains("filterForLanguages"));
        assert!(!q.contains("filterForGenres"));
    }
}
