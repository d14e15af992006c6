use anyhow::Result;

use crate::cli::SponsoredCommands;
use crate::db::NewListing;
use crate::services::sponsored::create_listing;
use crate::state::SharedState;

pub async fn cmd_sponsored(state: &SharedState, command: SponsoredCommands) -> Result<()> {
    match command {
        SponsoredCommands::List => {
            let listings = state.store.listing_repo().all().await?;
            println!("{}", serde_json::to_string_pretty(&listings)?);
        }

        SponsoredCommands::Match { hints, limit } => {
            let limit = limit.unwrap_or(state.config.sponsored.max_slots);
            let matched = state.sponsored_service.get_matching(&hints, limit).await?;
            println!("{}", serde_json::to_string_pretty(&matched)?);
        }

        SponsoredCommands::Click { id } => {
            let updated = state.sponsored_service.record_click(id).await?;
            println!(
                "Listing {} now at {} clicks ({})",
                updated.id, updated.total_clicks, updated.status
            );
        }

        SponsoredCommands::Add {
            title,
            feed_url,
            url,
            image_url,
            description,
            categories,
            priority,
            impression_limit,
            click_limit,
        } => {
            let categories = categories
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();

            let listing = create_listing(
                &state.store,
                NewListing {
                    title,
                    image_url,
                    description,
                    url,
                    feed_url,
                    categories,
                    priority: priority.min(100),
                    starts_at: None,
                    ends_at: None,
                    impression_limit,
                    click_limit,
                },
            )
            .await?;

            println!("Created listing {} ('{}')", listing.id, listing.title);
        }
    }

    Ok(())
}
