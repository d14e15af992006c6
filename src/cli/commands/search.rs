use anyhow::Result;

use crate::models::{SearchChannel, SearchRequest, SortOrder, UNFILTERED};
use crate::normalize::normalize;
use crate::state::SharedState;

pub struct SearchArgs {
    pub term: String,
    pub channel: String,
    pub tier: String,
    pub page: u32,
    pub page_size: u32,
    pub language: Option<String>,
    pub country: Option<String>,
    pub genre: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub safe: bool,
    pub sort: String,
    pub normalize: bool,
}

fn build_request(args: &SearchArgs) -> Result<SearchRequest> {
    let channel: SearchChannel = args.channel.parse().map_err(anyhow::Error::msg)?;
    let sort: SortOrder = args.sort.parse().map_err(anyhow::Error::msg)?;

    let mut request = SearchRequest::new(args.term.clone(), channel);
    request.page = args.page;
    request.page_size = args.page_size;
    request.language = args.language.clone().unwrap_or_else(|| UNFILTERED.into());
    request.country = args.country.clone().unwrap_or_else(|| UNFILTERED.into());
    request.genre = args.genre.clone().unwrap_or_else(|| UNFILTERED.into());
    request.after_date = args.after.clone().unwrap_or_default();
    request.before_date = args.before.clone().unwrap_or_default();
    request.safe_mode = args.safe;
    request.sort = sort;
    Ok(request)
}

pub async fn cmd_search(state: &SharedState, args: SearchArgs) -> Result<()> {
    let request = build_request(&args)?;
    let envelope = state.search_service.search(&request, &args.tier).await;

    if args.normalize {
        let items = envelope
            .payload
            .as_ref()
            .map(normalize)
            .unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&items)?);
        if !envelope.success {
            eprintln!(
                "search failed: {}",
                envelope.error.as_deref().unwrap_or("unknown error")
            );
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }

    Ok(())
}

pub async fn cmd_search_all(state: &SharedState, term: &str, tier: &str) -> Result<()> {
    let envelopes = state.search_service.search_all(term, tier).await;
    for envelope in &envelopes {
        let status = if envelope.success { "ok" } else { "failed" };
        println!(
            "{:<13} {:<15} {} ({} items{})",
            envelope.provider.to_string(),
            envelope.channel.to_string(),
            status,
            envelope.count,
            if envelope.from_cache { ", cached" } else { "" }
        );
        if let Some(error) = &envelope.error {
            println!("              {error}");
        }
    }
    Ok(())
}

pub async fn cmd_clamp(
    state: &SharedState,
    term: &str,
    channel: &str,
    tier: &str,
    page: u32,
    page_size: u32,
) -> Result<()> {
    let channel: SearchChannel = channel.parse().map_err(anyhow::Error::msg)?;
    let mut request = SearchRequest::new(term, channel);
    request.page = page;
    request.page_size = page_size;

    let clamped = state.search_service.clamp_request(&request, tier);
    println!("{}", serde_json::to_string_pretty(&clamped)?);
    Ok(())
}
