pub mod listing;
pub mod request;
pub mod results;

pub use listing::{ListingStatus, SponsoredListing};
pub use request::{SearchChannel, SearchRequest, SortOrder, UNFILTERED};
pub use results::{EpisodeDetails, NormalizedItem, RawPayload, SearchResultEnvelope};
