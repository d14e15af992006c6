use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clients::ProviderId;
use crate::constants::limits::MAX_TERM_LENGTH;
use crate::error::SearchError;

/// Sentinel meaning "no filter" for language/country/genre.
pub const UNFILTERED: &str = "ALL";

/// Which provider and query mode a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchChannel {
    PersonSearch,
    TitleSearch,
    PodcastSearch,
    EpisodeSearch,
    VideoSearch,
}

impl SearchChannel {
    /// Every channel is served by exactly one provider; the mapping is fixed
    /// at dispatch so downstream code never infers origin from payload shape.
    #[must_use]
    pub const fn provider(self) -> ProviderId {
        match self {
            Self::PersonSearch | Self::TitleSearch => ProviderId::ListenNotes,
            Self::PodcastSearch | Self::EpisodeSearch => ProviderId::Taddy,
            Self::VideoSearch => ProviderId::YouTube,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonSearch => "person-search",
            Self::TitleSearch => "title-search",
            Self::PodcastSearch => "podcast-search",
            Self::EpisodeSearch => "episode-search",
            Self::VideoSearch => "video-search",
        }
    }

    pub const ALL: [Self; 5] = [
        Self::PersonSearch,
        Self::TitleSearch,
        Self::PodcastSearch,
        Self::EpisodeSearch,
        Self::VideoSearch,
    ];
}

impl std::fmt::Display for SearchChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person-search" | "person" => Ok(Self::PersonSearch),
            "title-search" | "title" => Ok(Self::TitleSearch),
            "podcast-search" | "podcast" => Ok(Self::PodcastSearch),
            "episode-search" | "episode" => Ok(Self::EpisodeSearch),
            "video-search" | "video" => Ok(Self::VideoSearch),
            other => Err(format!("unknown search channel '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    BestMatch,
    Latest,
    Oldest,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BestMatch => "best-match",
            Self::Latest => "latest",
            Self::Oldest => "oldest",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best-match" | "best_match" | "relevance" => Ok(Self::BestMatch),
            "latest" => Ok(Self::Latest),
            "oldest" => Ok(Self::Oldest),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// A normalized search request. Must be clamped against the caller's tier
/// before it reaches a provider client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub term: String,

    pub channel: SearchChannel,

    /// ISO 639-1 language, or [`UNFILTERED`].
    pub language: String,

    /// ISO 3166-1 country, or [`UNFILTERED`].
    pub country: String,

    /// Genre/category tag, or [`UNFILTERED`].
    pub genre: String,

    /// Inclusive lower bound `YYYY-MM-DD`, empty = unbounded.
    pub after_date: String,

    /// Inclusive upper bound `YYYY-MM-DD`, empty = unbounded.
    pub before_date: String,

    pub safe_mode: bool,

    pub sort: SortOrder,

    pub page: u32,

    pub page_size: u32,
}

impl SearchRequest {
    #[must_use]
    pub fn new(term: impl Into<String>, channel: SearchChannel) -> Self {
        Self {
            term: term.into(),
            channel,
            language: UNFILTERED.to_string(),
            country: UNFILTERED.to_string(),
            genre: UNFILTERED.to_string(),
            after_date: String::new(),
            before_date: String::new(),
            safe_mode: false,
            sort: SortOrder::BestMatch,
            page: 1,
            page_size: 10,
        }
    }

    /// Structural validation, run before clamping. Clamping fixes values that
    /// are merely out of policy; malformed input is rejected outright.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.term.trim().is_empty() {
            return Err(SearchError::Validation("search term is empty".into()));
        }
        if self.term.len() > MAX_TERM_LENGTH {
            return Err(SearchError::Validation(format!(
                "search term exceeds {MAX_TERM_LENGTH} characters"
            )));
        }
        if self.page == 0 {
            return Err(SearchError::Validation("page must be >= 1".into()));
        }
        if self.page_size == 0 {
            return Err(SearchError::Validation("page size must be >= 1".into()));
        }

        let after = Self::parse_bound("after_date", &self.after_date)?;
        let before = Self::parse_bound("before_date", &self.before_date)?;
        if let (Some(a), Some(b)) = (after, before)
            && a > b
        {
            return Err(SearchError::Validation(
                "after_date is later than before_date".into(),
            ));
        }

        Ok(())
    }

    fn parse_bound(field: &str, value: &str) -> Result<Option<NaiveDate>, SearchError> {
        if value.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                SearchError::Validation(format!("{field} '{value}' is not a YYYY-MM-DD date"))
            })
    }

    /// Sorted `k=v` parameter pairs identifying this request for caching.
    /// Term is lowercased and trimmed so trivially different spellings share
    /// an entry; everything else is carried verbatim.
    #[must_use]
    pub fn canonical_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("after".to_string(), self.after_date.clone()),
            ("before".to_string(), self.before_date.clone()),
            ("country".to_string(), self.country.clone()),
            ("genre".to_string(), self.genre.clone()),
            ("lang".to_string(), self.language.clone()),
            ("page".to_string(), self.page.to_string()),
            ("safe".to_string(), self.safe_mode.to_string()),
            ("size".to_string(), self.page_size.to_string()),
            ("sort".to_string(), self.sort.to_string()),
            ("term".to_string(), self.term.trim().to_lowercase()),
        ];
        params.sort();
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_term() {
        let req = SearchRequest::new("  ", SearchChannel::PodcastSearch);
        assert!(req.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page() {
        let mut req = SearchRequest::new("climate", SearchChannel::PodcastSearch);
        req.page = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn validate_rejects_malformed_date() {
        let mut req = SearchRequest::new("climate", SearchChannel::EpisodeSearch);
        req.after_date = "01/01/2024".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let mut req = SearchRequest::new("climate", SearchChannel::EpisodeSearch);
        req.after_date = "2024-06-01".to_string();
        req.before_date = "2024-01-01".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn validate_accepts_open_bounds() {
        let mut req = SearchRequest::new("climate", SearchChannel::EpisodeSearch);
        req.after_date = "2024-01-01".to_string();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn canonical_params_are_sorted_and_case_folded() {
        let mut req = SearchRequest::new("  Climate  ", SearchChannel::PodcastSearch);
        req.page = 2;
        let params = req.canonical_params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
        assert!(params.contains(&("term".to_string(), "climate".to_string())));
    }

    #[test]
    fn channel_provider_mapping_is_fixed() {
        assert_eq!(SearchChannel::PodcastSearch.provider(), ProviderId::Taddy);
        assert_eq!(
            SearchChannel::PersonSearch.provider(),
            ProviderId::ListenNotes
        );
        assert_eq!(SearchChannel::VideoSearch.provider(), ProviderId::YouTube);
    }
}
