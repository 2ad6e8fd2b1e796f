//! Form-string grammar, career-state classification and history
//! reconciliation.
//!
//! A form string is a compact most-recent-last encoding of finishing
//! positions, e.g. `214X3361X652`: digits are positions and `x`/`X`
//! marks a spell between campaigns. The string is read right to left
//! for recency.

use serde::{Deserialize, Serialize};

use crate::scraper::parsers::horse_history::ParsedHistory;
use crate::types::{HorseForm, PerformanceStats, RaceResultDetail, StatsBundle};

/// Career state of a horse going into the race under analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceCategory {
    Normal,
    FirstUp,
    SecondUp,
    FirstStarter,
    Unknown,
}

impl RaceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RaceCategory::Normal => "normal",
            RaceCategory::FirstUp => "first_up",
            RaceCategory::SecondUp => "second_up",
            RaceCategory::FirstStarter => "first_starter",
            RaceCategory::Unknown => "unknown",
        }
    }
}

fn is_spell_marker(c: char) -> bool {
    c == 'x' || c == 'X'
}

/// Classify a form string, reading right to left.
pub fn classify(form: &str) -> RaceCategory {
    let chars: Vec<char> = form.trim().chars().rev().collect();

    match chars.first() {
        None => RaceCategory::Unknown,
        Some(&c) if is_spell_marker(c) => RaceCategory::FirstUp,
        Some(&c) if c.is_ascii_digit() => match chars.get(1) {
            Some(&next) if is_spell_marker(next) => RaceCategory::SecondUp,
            _ => RaceCategory::Normal,
        },
        Some(_) => RaceCategory::Unknown,
    }
}

/// Classify a horse given its synthesized form. A true debutant (no
/// race history at all, at least one trial sectional) is a first
/// starter, distinct from first-up which implies a prior campaign.
pub fn classify_horse(form: &str, horse_form: &HorseForm) -> RaceCategory {
    let no_history = horse_form.last_five.is_empty() && relevant_positions(form).is_empty();
    if no_history && !horse_form.trial_sectionals.is_empty() {
        return RaceCategory::FirstStarter;
    }
    classify(form)
}

/// Positions of the current campaign, most recent first.
///
/// Takes the substring after the last spell marker (the whole string if
/// there is none) and reads it right to left. `0` conventionally prints
/// for a finish of tenth or worse.
pub fn relevant_positions(form: &str) -> Vec<u32> {
    let trimmed = form.trim();
    let campaign = match trimmed.rfind(is_spell_marker) {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    };

    campaign
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .map(|d| if d == 0 { 10 } else { d })
        .collect()
}

/// Reconcile a form string against HTML-derived history rows.
///
/// The form string is the source of truth for positions. Each position
/// is merged with the first unused HTML row of equal position (first
/// match wins, by value only); unmatched positions keep placeholder
/// metadata but a real position. Without a form string the HTML rows
/// stand as-is. The result is capped at five entries, most recent
/// first.
pub fn reconcile(form: &str, html_rows: &[RaceResultDetail]) -> Vec<RaceResultDetail> {
    let positions = relevant_positions(form);
    if positions.is_empty() {
        return html_rows.iter().take(5).cloned().collect();
    }

    let mut used = vec![false; html_rows.len()];
    let mut merged = Vec::new();

    for position in positions.into_iter().take(5) {
        let matched = html_rows
            .iter()
            .enumerate()
            .find(|(i, row)| !used[*i] && row.position == position);

        match matched {
            Some((i, row)) => {
                used[i] = true;
                merged.push(row.clone());
            }
            None => merged.push(RaceResultDetail {
                position,
                ..Default::default()
            }),
        }
    }

    merged
}

/// Assemble a `HorseForm` from parsed history and the fields-page form
/// string. `race_distance` feeds the conservative distance-only stats
/// fallback.
pub fn build_horse_form(history: ParsedHistory, form: &str, race_distance: u32) -> HorseForm {
    let last_five = reconcile(form, &history.results);

    let stats = if history.track_stats.is_some()
        || history.distance_stats.is_some()
        || history.track_distance_stats.is_some()
    {
        Some(StatsBundle {
            track: history.track_stats.unwrap_or_default(),
            distance: history.distance_stats.unwrap_or_default(),
            track_distance: history.track_distance_stats.unwrap_or_default(),
            condition: history.condition_stats.clone(),
        })
    } else {
        distance_fallback_stats(&last_five, race_distance).map(|distance| StatsBundle {
            // Track and combined tallies stay at zero; the reconciled
            // history cannot attest track-specific success.
            track: PerformanceStats::default(),
            distance,
            track_distance: PerformanceStats::default(),
            condition: history.condition_stats.clone(),
        })
    };

    HorseForm {
        last_five,
        first_up: history.first_up,
        second_up: history.second_up,
        trial_sectionals: history.trial_sectionals,
        career: history.career,
        stats,
    }
}

/// Distance-only aggregate over the reconciled history: runs within
/// 200m of the target distance.
fn distance_fallback_stats(
    last_five: &[RaceResultDetail],
    race_distance: u32,
) -> Option<PerformanceStats> {
    let mut stats = PerformanceStats::default();

    for detail in last_five {
        let Some(distance) = detail.distance else {
            continue;
        };
        if race_distance.abs_diff(distance) > 200 {
            continue;
        }
        stats.runs += 1;
        match detail.position {
            1 => stats.wins += 1,
            2 => stats.seconds += 1,
            3 => stats.thirds += 1,
            _ => {}
        }
    }

    if stats.runs > 0 {
        Some(stats)
    } else {
        None
    }
}
