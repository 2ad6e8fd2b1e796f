//! Domain types shared across the extraction and scoring pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scraper::venue_key::VenueKey;

/// A venue racing on a particular date, discovered from the calendar page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub state: String,
    pub date: NaiveDate,
    /// Number of races scheduled, as counted from the calendar table.
    pub race_count: u32,
    /// Link to the pre-race fields page for this meeting.
    pub fields_url: String,
}

impl Track {
    /// Composite venue key of the `DateToken,State,VenueName` grammar.
    pub fn venue_key(&self) -> VenueKey {
        VenueKey {
            date: self.date,
            state: self.state.clone(),
            venue: self.name.clone(),
        }
    }
}

/// One race at a track, with its extracted field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    pub number: u32,
    pub name: String,
    /// Scheduled start time as printed in the header, e.g. "1:45PM".
    pub start_time: String,
    pub distance: u32,
    pub surface: String,
    /// Track condition, determined once per track document.
    pub condition: String,
    pub class: Option<String>,
    pub date: NaiveDate,
    pub horses: Vec<Horse>,
}

/// A runner in a race. Every mandatory field was present in the source
/// markup; rows missing any of them never become a `Horse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horse {
    pub saddle_number: u32,
    pub name: String,
    pub jockey: String,
    pub trainer: String,
    /// Allocated weight in kilograms.
    pub weight: f64,
    pub barrier: u32,
    pub odds: Option<f64>,
    /// Compact digit/spell-marker form string, most recent last. May be
    /// empty when the fields page carried none.
    pub form: String,
    /// Identity code from the horse-history link.
    pub horse_code: String,
    /// Race-entry token from the horse-history link.
    pub race_entry: String,
}

/// One historical race outcome reconciled for a horse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceResultDetail {
    pub position: u32,
    pub margin: Option<f64>,
    pub track: String,
    pub distance: Option<u32>,
    /// Condition token as printed, possibly with a rating digit ("Soft5").
    pub condition: Option<String>,
    /// Closing 600m sectional in seconds.
    pub sectional_600m: Option<f64>,
    /// Unknown dates exclude the run from freshness and date-keyed laws.
    pub date: Option<NaiveDate>,
    pub jockey: String,
    pub trainer: String,
    pub class: String,
}

/// Aggregate first-up or second-up record in `R:W-S-T` form.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpellPerformance {
    pub runs: u32,
    pub wins: u32,
    pub seconds: u32,
    pub thirds: u32,
}

/// Aggregate win/place tally for one dimension (track, distance, both,
/// or a condition category).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub runs: u32,
    pub wins: u32,
    pub seconds: u32,
    pub thirds: u32,
}

impl PerformanceStats {
    pub fn places(&self) -> u32 {
        self.wins + self.seconds + self.thirds
    }
}

/// Track/distance statistics scraped from the horse-history page, or
/// conservatively derived from the reconciled history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsBundle {
    pub track: PerformanceStats,
    pub distance: PerformanceStats,
    pub track_distance: PerformanceStats,
    pub condition: Option<ConditionStats>,
}

/// The condition category with the most runs, and its record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionStats {
    pub condition: String,
    pub stats: PerformanceStats,
}

/// A horse's reconciled history. Horses for which no form could be
/// synthesized are excluded from scoring entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HorseForm {
    /// Up to five recent results, most recent first.
    pub last_five: Vec<RaceResultDetail>,
    pub first_up: Option<SpellPerformance>,
    pub second_up: Option<SpellPerformance>,
    /// Closing 600m sectionals recorded in trials and jump-outs.
    pub trial_sectionals: Vec<f64>,
    pub career: Option<PerformanceStats>,
    pub stats: Option<StatsBundle>,
}

/// State premiership table entry for a jockey or trainer. Rank is the
/// 1-based source-table row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiershipEntry {
    pub name: String,
    pub rank: u32,
    pub wins: u32,
    pub seconds: u32,
    pub thirds: u32,
    pub fourths: u32,
    pub fifths: u32,
    pub prize_money: f64,
    pub strike_rate: f64,
    pub total_starts: u32,
    pub places: u32,
    pub points: u32,
    pub win_percentage: f64,
}

/// Per-law point contributions for one scored horse.
///
/// `up_performance` carries the first-up law for a first-up horse and
/// the second-up law for a second-up horse; they are never both active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub category: String,
    pub up_performance: f64,
    pub recent_form: f64,
    pub class_suitability: f64,
    pub track_distance: f64,
    pub sectional: f64,
    pub barrier: f64,
    pub jockey_rank: f64,
    pub trainer_rank: f64,
    pub jockey_horse: f64,
    pub condition_suitability: f64,
    pub weight_advantage: f64,
    pub freshness: f64,
}

impl ScoreBreakdown {
    /// Sum of the twelve law components.
    pub fn total(&self) -> f64 {
        self.up_performance
            + self.recent_form
            + self.class_suitability
            + self.track_distance
            + self.sectional
            + self.barrier
            + self.jockey_rank
            + self.trainer_rank
            + self.jockey_horse
            + self.condition_suitability
            + self.weight_advantage
            + self.freshness
    }
}

/// A scored runner. Only horses with real form data are scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHorse {
    pub horse: Horse,
    pub total: f64,
    pub breakdown: ScoreBreakdown,
    /// Tie-break marker for the strongest career record among
    /// equally-scored horses.
    pub standout: bool,
}

/// Bet confidence tier for the top-ranked horse of a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetTier {
    None,
    Moderate,
    High,
    Highest,
}

impl std::fmt::Display for BetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BetTier::None => "none",
            BetTier::Moderate => "moderate",
            BetTier::High => "high",
            BetTier::Highest => "highest",
        };
        f.write_str(s)
    }
}

/// Confidence grade attached to the field's top-ranked horse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BettingRecommendation {
    pub tier: BetTier,
    /// Point gap to the second-ranked horse.
    pub margin: f64,
    pub confidence: String,
}

/// Analysis output for a single race. `error` is a soft failure scoped
/// to this race only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceAnalysis {
    pub race_number: u32,
    pub race_name: String,
    pub distance: u32,
    pub condition: String,
    pub start_time: String,
    pub horses: Vec<ScoredHorse>,
    pub recommendation: Option<BettingRecommendation>,
    pub error: Option<String>,
}

/// Analysis output for one track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackAnalysis {
    pub track: Track,
    pub races: Vec<RaceAnalysis>,
    pub error: Option<String>,
}

/// Full output of one analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub date: NaiveDate,
    pub tracks: Vec<TrackAnalysis>,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}
