//! Punter API
//!
//! CLI for race-day field analysis: scrapes the racing authority's
//! free pages, scores every runner with real form data and grades the
//! betting opportunity in each race.

mod analysis;
mod betting;
mod cli;
mod config;
mod fetcher;
mod form;
mod scoring;
mod scraper;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "punter_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tracks { date } => cli::run_tracks(date).await,
        Commands::Analyse {
            date,
            track,
            format,
        } => cli::run_analyse(date, track, format).await,
    }
}
