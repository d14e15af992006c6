//! Command-line interface for Castarr.

pub mod commands;

use clap::{Parser, Subcommand};

/// Castarr - federated podcast & video search
#[derive(Parser)]
#[command(name = "castarr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a search against one channel
    #[command(alias = "s")]
    Search {
        /// Search term
        #[arg(required = true)]
        term: Vec<String>,

        /// person | title | podcast | episode | video
        #[arg(short, long, default_value = "podcast")]
        channel: String,

        /// Membership tier to clamp against
        #[arg(short, long, default_value = "free")]
        tier: String,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,

        /// ISO 639-1 language filter
        #[arg(short, long)]
        language: Option<String>,

        /// ISO 3166-1 country filter
        #[arg(long)]
        country: Option<String>,

        #[arg(short, long)]
        genre: Option<String>,

        /// Only results published on/after this date (YYYY-MM-DD)
        #[arg(long)]
        after: Option<String>,

        /// Only results published on/before this date (YYYY-MM-DD)
        #[arg(long)]
        before: Option<String>,

        #[arg(long)]
        safe: bool,

        /// best-match | latest | oldest
        #[arg(long, default_value = "best-match")]
        sort: String,

        /// Print normalized items instead of the raw envelope
        #[arg(short, long)]
        normalize: bool,
    },

    /// Query every provider once and report per-provider outcomes
    #[command(alias = "sa")]
    SearchAll {
        #[arg(required = true)]
        term: Vec<String>,

        #[arg(short, long, default_value = "free")]
        tier: String,
    },

    /// Show what a tier would do to a request without running it
    Clamp {
        #[arg(required = true)]
        term: Vec<String>,

        #[arg(short, long, default_value = "podcast")]
        channel: String,

        #[arg(short, long, default_value = "free")]
        tier: String,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },

    /// Flush the result cache
    ClearCache,

    /// Manage sponsored listings
    #[command(subcommand)]
    Sponsored(SponsoredCommands),
}

#[derive(Subcommand)]
pub enum SponsoredCommands {
    /// List every listing with counters
    List,

    /// Select eligible listings for the given category hints
    Match {
        /// Category hints, e.g. "technology" "true crime"
        hints: Vec<String>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Record a click on a listing
    Click { id: i64 },

    /// Create a listing
    Add {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        feed_url: String,

        #[arg(long, default_value = "")]
        url: String,

        #[arg(long, default_value = "")]
        image_url: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Comma-separated category tags
        #[arg(long, default_value = "")]
        categories: String,

        #[arg(long, default_value_t = 50)]
        priority: u8,

        /// 0 = unlimited
        #[arg(long, default_value_t = 0)]
        impression_limit: u64,

        /// 0 = unlimited
        #[arg(long, default_value_t = 0)]
        click_limit: u64,
    },
}
