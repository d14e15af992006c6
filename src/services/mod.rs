pub mod search;
pub mod sponsored;

pub use search::SearchService;
pub use sponsored::{ListingStore, SponsoredService};
