use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Paused,
    Expired,
}

impl ListingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown listing status '{other}'")),
        }
    }
}

/// A paid listing injected alongside organic results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsoredListing {
    pub id: i64,

    pub title: String,

    pub image_url: String,

    pub description: String,

    pub url: String,

    pub feed_url: String,

    pub categories: Vec<String>,

    /// 0-100, higher is selected first.
    pub priority: u8,

    pub status: ListingStatus,

    pub starts_at: Option<DateTime<Utc>>,

    pub ends_at: Option<DateTime<Utc>>,

    /// 0 = unlimited.
    pub impression_limit: u64,

    /// 0 = unlimited.
    pub click_limit: u64,

    pub total_impressions: u64,

    pub total_clicks: u64,
}

impl SponsoredListing {
    /// True once either non-zero exposure limit has been reached. The caller
    /// is responsible for flipping status to expired when this turns true.
    #[must_use]
    pub const fn limits_exhausted(&self) -> bool {
        (self.impression_limit > 0 && self.total_impressions >= self.impression_limit)
            || (self.click_limit > 0 && self.total_clicks >= self.click_limit)
    }

    /// Formats the listing the way organic results are shaped so callers can
    /// splice it into a result list.
    #[must_use]
    pub fn as_normalized(&self) -> crate::models::results::NormalizedItem {
        crate::models::results::NormalizedItem {
            title: self.title.clone(),
            artwork_url: self.image_url.clone(),
            description: self.description.clone(),
            publisher: String::new(),
            explicit: false,
            categories: self.categories.clone(),
            feed_url: self.feed_url.clone(),
            provider_ref: self.id.to_string(),
            uuid: String::new(),
            episode: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> SponsoredListing {
        SponsoredListing {
            id: 1,
            title: "Acme Podcast".to_string(),
            image_url: String::new(),
            description: String::new(),
            url: String::new(),
            feed_url: "https://feeds.example.com/acme".to_string(),
            categories: vec!["Technology".to_string()],
            priority: 50,
            status: ListingStatus::Active,
            starts_at: None,
            ends_at: None,
            impression_limit: 0,
            click_limit: 0,
            total_impressions: 0,
            total_clicks: 0,
        }
    }

    #[test]
    fn zero_limits_never_exhaust() {
        let mut l = listing();
        l.total_impressions = 1_000_000;
        l.total_clicks = 1_000_000;
        assert!(!l.limits_exhausted());
    }

    #[test]
    fn impression_limit_exhausts_at_boundary() {
        let mut l = listing();
        l.impression_limit = 5;
        l.total_impressions = 4;
        assert!(!l.limits_exhausted());
        l.total_impressions = 5;
        assert!(l.limits_exhausted());
    }

    #[test]
    fn formats_like_an_organic_result() {
        let l = listing();
        let item = l.as_normalized();
        assert_eq!(item.title, "Acme Podcast");
        assert_eq!(item.feed_url, "https://feeds.example.com/acme");
        assert!(item.has_identifier());
    }
}
