pub mod cache;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod normalize;
pub mod ratelimit;
pub mod services;
pub mod state;
pub mod tier;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = cli::Cli::parse();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        cli::Cli::command().print_help()?;
        return Ok(());
    };

    let state = SharedState::new(config).await?;

    match command {
        cli::Commands::Search {
            term,
            channel,
            tier,
            page,
            page_size,
            language,
            country,
            genre,
            after,
            before,
            safe,
            sort,
            normalize,
        } => {
            cli::commands::cmd_search(
                &state,
                cli::commands::SearchArgs {
                    term: term.join(" "),
                    channel,
                    tier,
                    page,
                    page_size,
                    language,
                    country,
                    genre,
                    after,
                    before,
                    safe,
                    sort,
                    normalize,
                },
            )
            .await
        }

        cli::Commands::SearchAll { term, tier } => {
            cli::commands::cmd_search_all(&state, &term.join(" "), &tier).await
        }

        cli::Commands::Clamp {
            term,
            channel,
            tier,
            page,
            page_size,
        } => {
            cli::commands::cmd_clamp(&state, &term.join(" "), &channel, &tier, page, page_size)
                .await
        }

        cli::Commands::ClearCache => cli::commands::cmd_clear_cache(&state).await,

        cli::Commands::Sponsored(command) => cli::commands::cmd_sponsored(&state, command).await,
    }
}
