use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::db::{ListingRepository, NewListing, Store};
use crate::models::{ListingStatus, SponsoredListing};

/// Persistent listing storage, an external collaborator from the matcher's
/// point of view. Counter increments are atomic and return the updated row so
/// exposure limits can be re-evaluated in the same step.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn active_listings(&self) -> Result<Vec<SponsoredListing>>;

    async fn increment_impressions(&self, id: i64) -> Result<SponsoredListing>;

    async fn increment_clicks(&self, id: i64) -> Result<SponsoredListing>;

    async fn set_status(&self, id: i64, status: ListingStatus) -> Result<()>;

    async fn record_daily_stat(
        &self,
        id: i64,
        date: NaiveDate,
        impressions: u64,
        clicks: u64,
    ) -> Result<()>;
}

#[async_trait]
impl ListingStore for ListingRepository {
    async fn active_listings(&self) -> Result<Vec<SponsoredListing>> {
        self.active().await
    }

    async fn increment_impressions(&self, id: i64) -> Result<SponsoredListing> {
        Self::increment_impressions(self, id).await
    }

    async fn increment_clicks(&self, id: i64) -> Result<SponsoredListing> {
        Self::increment_clicks(self, id).await
    }

    async fn set_status(&self, id: i64, status: ListingStatus) -> Result<()> {
        Self::set_status(self, id, status).await
    }

    async fn record_daily_stat(
        &self,
        id: i64,
        date: NaiveDate,
        impressions: u64,
        clicks: u64,
    ) -> Result<()> {
        Self::record_daily_stat(self, id, date, impressions, clicks).await
    }
}

/// Selects paid listings to splice into search results and keeps their
/// exposure counters honest.
pub struct SponsoredService {
    store: Arc<dyn ListingStore>,
}

impl SponsoredService {
    #[must_use]
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn from_store(store: &Store) -> Self {
        Self::new(Arc::new(store.listing_repo()))
    }

    /// Returns up to `limit` eligible listings, highest priority first with
    /// random tie-breaks. Each returned listing is charged exactly one
    /// impression, and a listing whose limit is reached by that impression is
    /// expired on the spot.
    pub async fn get_matching(
        &self,
        category_hints: &[String],
        limit: usize,
    ) -> Result<Vec<SponsoredListing>> {
        let now = Utc::now();
        let mut candidates: Vec<SponsoredListing> = self
            .store
            .active_listings()
            .await?
            .into_iter()
            .filter(|l| is_eligible(l, now, category_hints))
            .collect();

        // Shuffle first so the stable sort keeps a random order within each
        // priority band.
        candidates.shuffle(&mut rand::rng());
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
        candidates.truncate(limit);

        let mut selected = Vec::with_capacity(candidates.len());
        for listing in candidates {
            selected.push(self.charge_impression(listing.id, now).await?);
        }

        debug!(
            hints = ?category_hints,
            returned = selected.len(),
            "sponsored match"
        );
        Ok(selected)
    }

    async fn charge_impression(&self, id: i64, now: DateTime<Utc>) -> Result<SponsoredListing> {
        let updated = self.store.increment_impressions(id).await?;
        self.store
            .record_daily_stat(id, now.date_naive(), 1, 0)
            .await?;
        self.expire_if_exhausted(&updated).await?;
        Ok(updated)
    }

    /// Registers one click for a listing, expiring it if the click limit is
    /// now reached.
    pub async fn record_click(&self, id: i64) -> Result<SponsoredListing> {
        let updated = self.store.increment_clicks(id).await?;
        self.store
            .record_daily_stat(id, Utc::now().date_naive(), 0, 1)
            .await?;
        self.expire_if_exhausted(&updated).await?;
        Ok(updated)
    }

    /// The limit check happens synchronously as part of every increment, not
    /// deferred to the next matching pass.
    async fn expire_if_exhausted(&self, listing: &SponsoredListing) -> Result<()> {
        if listing.status != ListingStatus::Expired && listing.limits_exhausted() {
            info!(listing = listing.id, "exposure limit reached, expiring listing");
            self.store
                .set_status(listing.id, ListingStatus::Expired)
                .await?;
        }
        Ok(())
    }
}

/// All conditions must hold: active status, inside the optional validity
/// window, limits not exhausted, and (when hints are given) at least one hint
/// substring-matching a category tag, case-insensitively.
#[must_use]
pub fn is_eligible(
    listing: &SponsoredListing,
    now: DateTime<Utc>,
    category_hints: &[String],
) -> bool {
    if listing.status != ListingStatus::Active {
        return false;
    }
    if listing.starts_at.is_some_and(|start| now < start) {
        return false;
    }
    if listing.ends_at.is_some_and(|end| now > end) {
        return false;
    }
    if listing.limits_exhausted() {
        return false;
    }
    if category_hints.is_empty() {
        return true;
    }

    category_hints.iter().any(|hint| {
        let hint = hint.to_lowercase();
        !hint.is_empty()
            && listing
                .categories
                .iter()
                .any(|tag| tag.to_lowercase().contains(&hint))
    })
}

/// Convenience used by the CLI to seed listings.
pub async fn create_listing(store: &Store, input: NewListing) -> Result<SponsoredListing> {
    store.listing_repo().create(input).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(status: ListingStatus) -> SponsoredListing {
        SponsoredListing {
            id: 1,
            title: "Acme".to_string(),
            image_url: String::new(),
            description: String::new(),
            url: String::new(),
            feed_url: String::new(),
            categories: vec!["True Crime".to_string(), "Technology".to_string()],
            priority: 50,
            status,
            starts_at: None,
            ends_at: None,
            impression_limit: 0,
            click_limit: 0,
            total_impressions: 0,
            total_clicks: 0,
        }
    }

    #[test]
    fn paused_and_expired_are_ineligible() {
        let now = Utc::now();
        assert!(is_eligible(&listing(ListingStatus::Active), now, &[]));
        assert!(!is_eligible(&listing(ListingStatus::Paused), now, &[]));
        assert!(!is_eligible(&listing(ListingStatus::Expired), now, &[]));
    }

    #[test]
    fn validity_window_bounds_are_honored() {
        let now = Utc::now();
        let mut l = listing(ListingStatus::Active);
        l.starts_at = Some(now + chrono::Duration::hours(1));
        assert!(!is_eligible(&l, now, &[]));

        l.starts_at = None;
        l.ends_at = Some(now - chrono::Duration::hours(1));
        assert!(!is_eligible(&l, now, &[]));

        l.starts_at = Some(now - chrono::Duration::hours(1));
        l.ends_at = Some(now + chrono::Duration::hours(1));
        assert!(is_eligible(&l, now, &[]));
    }

    #[test]
    fn hints_match_case_insensitive_substrings() {
        let now = Utc::now();
        let l = listing(ListingStatus::Active);
        assert!(is_eligible(&l, now, &["crime".to_string()]));
        assert!(is_eligible(&l, now, &["TECH".to_string()]));
        assert!(!is_eligible(&l, now, &["sports".to_string()]));
    }

    #[test]
    fn no_hints_means_all_active_listings_are_eligible() {
        let now = Utc::now();
        let mut l = listing(ListingStatus::Active);
        l.categories.clear();
        assert!(is_eligible(&l, now, &[]));
    }

    #[test]
    fn exhausted_limits_are_ineligible() {
        let now = Utc::now();
        let mut l = listing(ListingStatus::Active);
        l.impression_limit = 5;
        l.total_impressions = 5;
        assert!(!is_eligible(&l, now, &[]));
    }
}
