pub mod cache;
pub mod listing;
