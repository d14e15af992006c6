mod cache;
mod search;
mod sponsored;

pub use cache::cmd_clear_cache;
pub use search::{SearchArgs, cmd_clamp, cmd_search, cmd_search_all};
pub use sponsored::cmd_sponsored;
