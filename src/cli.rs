//! CLI commands for punter-api.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::config::AppConfig;
use crate::fetcher::HttpFetcher;
use crate::types::{AnalysisReport, RaceAnalysis};

#[derive(Parser)]
#[command(name = "punter-api")]
#[command(version, about = "Race-day field analysis and betting recommendations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the tracks racing on a date
    Tracks {
        /// Date to inspect (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Analyse every field racing on a date
    Analyse {
        /// Date to analyse (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Restrict the analysis to one track by name
        #[arg(short, long)]
        track: Option<String>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn build_analyzer() -> anyhow::Result<Analyzer> {
    let config = AppConfig::load()?;
    let fetcher = HttpFetcher::new(&config.scraper)?;
    Ok(Analyzer::new(Arc::new(fetcher), config))
}

fn resolve_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| chrono::Local::now().date_naive())
}

/// List tracks racing on the requested date.
pub async fn run_tracks(date: Option<NaiveDate>) -> anyhow::Result<()> {
    let date = resolve_date(date);
    let analyzer = build_analyzer()?;
    let tracks = analyzer.list_tracks(date).await?;

    if tracks.is_empty() {
        println!("No tracks racing on {}", date);
        return Ok(());
    }

    println!("Tracks racing on {}:", date);
    for track in tracks {
        println!("  {:<4} {:<28} {} races", track.state, track.name, track.race_count);
    }
    Ok(())
}

/// Run the full analysis pipeline and print the report.
pub async fn run_analyse(
    date: Option<NaiveDate>,
    track: Option<String>,
    format: String,
) -> anyhow::Result<()> {
    let date = resolve_date(date);
    let analyzer = build_analyzer()?;
    let report = analyzer.analyse(date, track.as_deref()).await;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "table" => print_report(&report),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Print an analysis report in table format.
fn print_report(report: &AnalysisReport) {
    println!("Analysis for {}", report.date);

    if let Some(error) = &report.error {
        println!("  FAILED: {}", error);
        return;
    }
    if report.tracks.is_empty() {
        println!("  No tracks to analyse.");
        return;
    }

    for track in &report.tracks {
        println!();
        println!("=== {} ({}) ===", track.track.name, track.track.state);
        if let Some(error) = &track.error {
            println!("  skipped: {}", error);
            continue;
        }
        for race in &track.races {
            print_race(race);
        }
    }

    println!();
    println!("Completed in {}ms", report.elapsed_ms);
}

fn print_race(race: &RaceAnalysis) {
    println!();
    println!(
        "Race {} - {} {} ({}m, {})",
        race.race_number, race.start_time, race.race_name, race.distance, race.condition
    );

    if let Some(error) = &race.error {
        println!("  skipped: {}", error);
        return;
    }

    for (i, scored) in race.horses.iter().enumerate() {
        let marker = if scored.standout { "*" } else { " " };
        println!(
            "  {:2}.{} #{:<2} {:<24} {:>6.1}  ({})",
            i + 1,
            marker,
            scored.horse.saddle_number,
            scored.horse.name,
            scored.total,
            scored.breakdown.category
        );
    }

    if let Some(rec) = &race.recommendation {
        println!(
            "  Recommendation: {} (margin {:.1}, confidence {})",
            rec.tier, rec.margin, rec.confidence
        );
    }
}
