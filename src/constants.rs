pub mod cache {

    /// Namespace prefix for every key this process writes.
    pub const KEY_PREFIX: &str = "castarr:search";

    /// Catalog data changes slowly, so structured podcast results live longest.
    pub const PODCAST_TTL_SECS: u64 = 86_400;

    pub const EPISODE_TTL_SECS: u64 = 3_600;

    pub const PERSON_TTL_SECS: u64 = 3_600;

    pub const TITLE_TTL_SECS: u64 = 3_600;

    pub const VIDEO_TTL_SECS: u64 = 900;
}

pub mod providers {

    /// Hard cap Taddy accepts for `limitPerPage`.
    pub const TADDY_MAX_PAGE_SIZE: u32 = 25;

    /// Hard cap Listen Notes accepts for `page_size`.
    pub const LISTEN_NOTES_MAX_PAGE_SIZE: u32 = 10;

    /// Hard cap the YouTube Data API accepts for `maxResults`.
    pub const YOUTUBE_MAX_RESULTS: u32 = 50;

    pub const TADDY_ENDPOINT: &str = "https://api.taddy.org";

    pub const LISTEN_NOTES_ENDPOINT: &str = "https://listen-api.listennotes.com/api/v2";

    pub const YOUTUBE_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3";
}

pub mod ratelimit {

    /// Fallback window for providers with no configured limit.
    pub const DEFAULT_CAPACITY: usize = 10;

    pub const DEFAULT_WINDOW_SECS: u64 = 60;
}

pub mod limits {

    pub const MAX_TERM_LENGTH: usize = 200;

    pub const DEFAULT_SPONSORED_SLOTS: usize = 3;
}
