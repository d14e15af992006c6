pub use super::cache_entry::Entity as CacheEntry;
pub use super::listing_stat::Entity as ListingStat;
pub use super::sponsored_listing::Entity as SponsoredListingRow;
