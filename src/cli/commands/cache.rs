use anyhow::Result;

use crate::state::SharedState;

pub async fn cmd_clear_cache(state: &SharedState) -> Result<()> {
    let cleared = state.search_service.clear_all_caches().await;
    println!("Cleared {cleared} cached result(s)");
    Ok(())
}
