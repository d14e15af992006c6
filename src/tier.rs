use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TierConfig;
use crate::models::{SearchRequest, SortOrder, UNFILTERED};

pub const MIN_PAGE_SIZE: u32 = 1;

/// Immutable capability limits for one membership tier. Loaded once from
/// config and never mutated while a request is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub max_pages: u32,

    pub max_page_size: u32,

    /// Upper bound passed to providers, independent of paging.
    pub provider_max_results: u32,

    pub language_filter: bool,

    pub country_filter: bool,

    pub genre_filter: bool,

    pub date_filter: bool,

    pub allowed_sorts: Vec<SortOrder>,

    pub safe_mode_forced: bool,
}

impl TierLimits {
    /// Fail-closed default used for unknown or unassigned tiers: smallest
    /// caps, no filters, forced safe mode, best-match only.
    #[must_use]
    pub fn restricted() -> Self {
        Self {
            max_pages: 1,
            max_page_size: 5,
            provider_max_results: 5,
            language_filter: false,
            country_filter: false,
            genre_filter: false,
            date_filter: false,
            allowed_sorts: vec![SortOrder::BestMatch],
            safe_mode_forced: true,
        }
    }
}

/// Maps tier names to limits and clamps requests against them.
#[derive(Debug, Clone)]
pub struct TierPolicy {
    tiers: HashMap<String, TierLimits>,
    fallback: TierLimits,
}

impl TierPolicy {
    #[must_use]
    pub fn new(tiers: HashMap<String, TierLimits>) -> Self {
        Self {
            tiers,
            fallback: TierLimits::restricted(),
        }
    }

    #[must_use]
    pub fn from_config(configs: &[TierConfig]) -> Self {
        let tiers = configs
            .iter()
            .map(|c| (c.name.clone(), c.to_limits()))
            .collect();
        Self::new(tiers)
    }

    #[must_use]
    pub fn limits_for(&self, tier: &str) -> &TierLimits {
        self.tiers.get(tier).unwrap_or_else(|| {
            debug!(tier, "unknown tier, applying restricted limits");
            &self.fallback
        })
    }

    /// Applies the tier's limits in a fixed order: page, page size, filter
    /// permissions, forced safe mode, sort allow-list. The result is safe to
    /// hand to a provider client.
    #[must_use]
    pub fn clamp_request(&self, request: &SearchRequest, tier: &str) -> SearchRequest {
        let limits = self.limits_for(tier);
        let mut clamped = request.clone();

        clamped.page = clamped.page.clamp(1, limits.max_pages.max(1));
        clamped.page_size = clamped
            .page_size
            .clamp(MIN_PAGE_SIZE, limits.max_page_size.max(MIN_PAGE_SIZE));

        if !limits.language_filter {
            clamped.language = UNFILTERED.to_string();
        }
        if !limits.country_filter {
            clamped.country = UNFILTERED.to_string();
        }
        if !limits.genre_filter {
            clamped.genre = UNFILTERED.to_string();
        }
        if !limits.date_filter {
            clamped.after_date = String::new();
            clamped.before_date = String::new();
        }

        if limits.safe_mode_forced {
            clamped.safe_mode = true;
        }

        if clamped.sort != SortOrder::BestMatch && !limits.allowed_sorts.contains(&clamped.sort) {
            clamped.sort = SortOrder::BestMatch;
        }

        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchChannel;

    fn policy() -> TierPolicy {
        let mut tiers = HashMap::new();
        tiers.insert(
            "pro".to_string(),
            TierLimits {
                max_pages: 5,
                max_page_size: 10,
                provider_max_results: 25,
                language_filter: true,
                country_filter: true,
                genre_filter: true,
                date_filter: true,
                allowed_sorts: vec![SortOrder::BestMatch, SortOrder::Latest],
                safe_mode_forced: false,
            },
        );
        tiers.insert(
            "free".to_string(),
            TierLimits {
                max_pages: 2,
                max_page_size: 5,
                provider_max_results: 10,
                language_filter: false,
                country_filter: false,
                genre_filter: false,
                date_filter: false,
                allowed_sorts: vec![SortOrder::BestMatch],
                safe_mode_forced: true,
            },
        );
        TierPolicy::new(tiers)
    }

    fn request() -> SearchRequest {
        SearchRequest::new("climate", SearchChannel::PodcastSearch)
    }

    #[test]
    fn page_and_size_stay_within_limits() {
        let policy = policy();
        for (page, size) in [(0u32, 0u32), (1, 1), (7, 10), (100, 1000)] {
            let mut req = request();
            req.page = page;
            req.page_size = size;
            let clamped = policy.clamp_request(&req, "pro");
            assert!(clamped.page >= 1 && clamped.page <= 5);
            assert!(clamped.page_size >= MIN_PAGE_SIZE && clamped.page_size <= 10);
        }
    }

    #[test]
    fn in_range_request_is_untouched() {
        let policy = policy();
        let mut req = request();
        req.page = 1;
        req.page_size = 10;
        let clamped = policy.clamp_request(&req, "pro");
        assert_eq!(clamped, req);
    }

    #[test]
    fn unpermitted_date_filter_is_reset() {
        let policy = policy();
        let mut req = request();
        req.after_date = "2024-01-01".to_string();
        let clamped = policy.clamp_request(&req, "free");
        assert_eq!(clamped.after_date, "");
    }

    #[test]
    fn unpermitted_filters_fall_back_to_sentinels() {
        let policy = policy();
        let mut req = request();
        req.language = "en".to_string();
        req.country = "us".to_string();
        req.genre = "Technology".to_string();
        let clamped = policy.clamp_request(&req, "free");
        assert_eq!(clamped.language, UNFILTERED);
        assert_eq!(clamped.country, UNFILTERED);
        assert_eq!(clamped.genre, UNFILTERED);
    }

    #[test]
    fn unknown_tier_fails_closed() {
        let policy = policy();
        let mut req = request();
        req.language = "en".to_string();
        req.country = "us".to_string();
        req.genre = "News".to_string();
        req.after_date = "2024-01-01".to_string();
        req.safe_mode = false;
        req.page = 50;
        let clamped = policy.clamp_request(&req, "platinum-unheard-of");
        assert!(clamped.safe_mode);
        assert_eq!(clamped.language, UNFILTERED);
        assert_eq!(clamped.country, UNFILTERED);
        assert_eq!(clamped.genre, UNFILTERED);
        assert_eq!(clamped.after_date, "");
        assert_eq!(clamped.page, 1);
    }

    #[test]
    fn disallowed_sort_becomes_best_match() {
        let policy = policy();
        let mut req = request();
        req.sort = SortOrder::Oldest;
        let clamped = policy.clamp_request(&req, "pro");
        assert_eq!(clamped.sort, SortOrder::BestMatch);

        req.sort = SortOrder::Latest;
        let clamped = policy.clamp_request(&req, "pro");
        assert_eq!(clamped.sort, SortOrder::Latest);
    }

    #[test]
    fn forced_safe_mode_overrides_caller() {
        let policy = policy();
        let mut req = request();
        req.safe_mode = false;
        assert!(policy.clamp_request(&req, "free").safe_mode);
        assert!(!policy.clamp_request(&req, "pro").safe_mode);
    }
}
