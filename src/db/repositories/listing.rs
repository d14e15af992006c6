use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entities::{
    listing_stat,
    prelude::{ListingStat, SponsoredListingRow},
    sponsored_listing,
};
use crate::models::{ListingStatus, SponsoredListing};

/// Input for creating a listing; counters always start at zero.
#[derive(Debug, Clone, Default)]
pub struct NewListing {
    pub title: String,
    pub image_url: String,
    pub description: String,
    pub url: String,
    pub feed_url: String,
    pub categories: Vec<String>,
    pub priority: u8,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub impression_limit: u64,
    pub click_limit: u64,
}

pub struct ListingRepository {
    conn: DatabaseConnection,
}

impl ListingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: NewListing) -> Result<SponsoredListing> {
        let categories = serde_json::to_string(&input.categories)?;
        let active_model = sponsored_listing::ActiveModel {
            title: Set(input.title),
            image_url: Set(input.image_url),
            description: Set(input.description),
            url: Set(input.url),
            feed_url: Set(input.feed_url),
            categories: Set(categories),
            priority: Set(i32::from(input.priority)),
            status: Set(ListingStatus::Active.to_string()),
            starts_at: Set(input.starts_at.map(|t| t.to_rfc3339())),
            ends_at: Set(input.ends_at.map(|t| t.to_rfc3339())),
            #[allow(clippy::cast_possible_wrap)]
            impression_limit: Set(input.impression_limit as i64),
            #[allow(clippy::cast_possible_wrap)]
            click_limit: Set(input.click_limit as i64),
            total_impressions: Set(0),
            total_clicks: Set(0),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let result = SponsoredListingRow::insert(active_model)
            .exec(&self.conn)
            .await?;
        self.get(result.last_insert_id)
            .await?
            .ok_or_else(|| anyhow!("listing {} vanished after insert", result.last_insert_id))
    }

    pub async fn get(&self, id: i64) -> Result<Option<SponsoredListing>> {
        let row = SponsoredListingRow::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(to_listing))
    }

    pub async fn all(&self) -> Result<Vec<SponsoredListing>> {
        let rows = SponsoredListingRow::find()
            .order_by_desc(sponsored_listing::Column::Priority)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(to_listing).collect())
    }

    pub async fn active(&self) -> Result<Vec<SponsoredListing>> {
        let rows = SponsoredListingRow::find()
            .filter(sponsored_listing::Column::Status.eq(ListingStatus::Active.as_str()))
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(to_listing).collect())
    }

    pub async fn set_status(&self, id: i64, status: ListingStatus) -> Result<()> {
        SponsoredListingRow::update_many()
            .col_expr(
                sponsored_listing::Column::Status,
                Expr::value(status.to_string()),
            )
            .filter(sponsored_listing::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Atomic `+1` on the impression counter; returns the updated listing so
    /// the caller can re-evaluate exposure limits immediately.
    pub async fn increment_impressions(&self, id: i64) -> Result<SponsoredListing> {
        self.increment(id, sponsored_listing::Column::TotalImpressions)
            .await
    }

    /// Atomic `+1` on the click counter; returns the updated listing.
    pub async fn increment_clicks(&self, id: i64) -> Result<SponsoredListing> {
        self.increment(id, sponsored_listing::Column::TotalClicks)
            .await
    }

    async fn increment(
        &self,
        id: i64,
        column: sponsored_listing::Column,
    ) -> Result<SponsoredListing> {
        SponsoredListingRow::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .filter(sponsored_listing::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        self.get(id)
            .await?
            .ok_or_else(|| anyhow!("listing {id} not found"))
    }

    /// Upserts the daily aggregate row for `(listing, date)`.
    pub async fn record_daily_stat(
        &self,
        listing_id: i64,
        date: NaiveDate,
        impressions: u64,
        clicks: u64,
    ) -> Result<()> {
        let date = date.format("%Y-%m-%d").to_string();
        #[allow(clippy::cast_possible_wrap)]
        let (impressions, clicks) = (impressions as i64, clicks as i64);

        let existing = ListingStat::find()
            .filter(listing_stat::Column::ListingId.eq(listing_id))
            .filter(listing_stat::Column::Date.eq(&date))
            .one(&self.conn)
            .await?;

        if let Some(row) = existing {
            ListingStat::update_many()
                .col_expr(
                    listing_stat::Column::Impressions,
                    Expr::col(listing_stat::Column::Impressions).add(impressions),
                )
                .col_expr(
                    listing_stat::Column::Clicks,
                    Expr::col(listing_stat::Column::Clicks).add(clicks),
                )
                .filter(listing_stat::Column::Id.eq(row.id))
                .exec(&self.conn)
                .await?;
        } else {
            let active_model = listing_stat::ActiveModel {
                listing_id: Set(listing_id),
                date: Set(date),
                impressions: Set(impressions),
                clicks: Set(clicks),
                ..Default::default()
            };
            ListingStat::insert(active_model).exec(&self.conn).await?;
        }

        Ok(())
    }

    pub async fn stats_for(&self, listing_id: i64) -> Result<Vec<listing_stat::Model>> {
        Ok(ListingStat::find()
            .filter(listing_stat::Column::ListingId.eq(listing_id))
            .order_by_asc(listing_stat::Column::Date)
            .all(&self.conn)
            .await?)
    }
}

fn to_listing(row: sponsored_listing::Model) -> SponsoredListing {
    SponsoredListing {
        id: row.id,
        title: row.title,
        image_url: row.image_url,
        description: row.description,
        url: row.url,
        feed_url: row.feed_url,
        categories: serde_json::from_str(&row.categories).unwrap_or_default(),
        priority: u8::try_from(row.priority.clamp(0, 100)).unwrap_or(0),
        status: row.status.parse().unwrap_or(ListingStatus::Paused),
        starts_at: parse_ts(row.starts_at.as_deref()),
        ends_at: parse_ts(row.ends_at.as_deref()),
        impression_limit: u64::try_from(row.impression_limit.max(0)).unwrap_or(0),
        click_limit: u64::try_from(row.click_limit.max(0)).unwrap_or(0),
        total_impressions: u64::try_from(row.total_impressions.max(0)).unwrap_or(0),
        total_clicks: u64::try_from(row.total_clicks.max(0)).unwrap_or(0),
    }
}

fn parse_ts(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
