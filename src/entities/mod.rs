pub mod prelude;

pub mod cache_entry;
pub mod listing_stat;
pub mod sponsored_listing;
