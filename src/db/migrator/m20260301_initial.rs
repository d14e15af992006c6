use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CacheEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CacheEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CacheEntries::Key)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CacheEntries::Value).text().not_null())
                    .col(
                        ColumnDef::new(CacheEntries::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CacheEntries::ExpiresAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cache_entries_expires_at")
                    .table(CacheEntries::Table)
                    .col(CacheEntries::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SponsoredListings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SponsoredListings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SponsoredListings::Title).string().not_null())
                    .col(
                        ColumnDef::new(SponsoredListings::ImageUrl)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::Url)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::FeedUrl)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::Categories)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(SponsoredListings::StartsAt).timestamp())
                    .col(ColumnDef::new(SponsoredListings::EndsAt).timestamp())
                    .col(
                        ColumnDef::new(SponsoredListings::ImpressionLimit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::ClickLimit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::TotalImpressions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::TotalClicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SponsoredListings::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sponsored_listings_status")
                    .table(SponsoredListings::Table)
                    .col(SponsoredListings::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ListingStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ListingStats::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ListingStats::ListingId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ListingStats::Date).string().not_null())
                    .col(
                        ColumnDef::new(ListingStats::Impressions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ListingStats::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_listing_stats_listing_date")
                    .table(ListingStats::Table)
                    .col(ListingStats::ListingId)
                    .col(ListingStats::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ListingStats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SponsoredListings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CacheEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CacheEntries {
    Table,
    Id,
    Key,
    Value,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum SponsoredListings {
    Table,
    Id,
    Title,
    ImageUrl,
    Description,
    Url,
    FeedUrl,
    Categories,
    Priority,
    Status,
    StartsAt,
    EndsAt,
    ImpressionLimit,
    ClickLimit,
    TotalImpressions,
    TotalClicks,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ListingStats {
    Table,
    Id,
    ListingId,
    Date,
    Impressions,
    Clicks,
}
