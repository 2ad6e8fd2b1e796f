//! Horse history parser: turns a horse's full-form document into raw
//! race results, up-statistics and aggregate tallies.
//!
//! The canonical results table is the single source of race history.
//! When it is absent the parser reports no history at all, and the
//! caller excludes the horse from scoring; nothing is fabricated.

use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use super::{condition_category, element_text, is_person_name, parse_record};
use crate::scraper::venue_key::normalize_month;
use crate::types::{ConditionStats, PerformanceStats, RaceResultDetail, SpellPerformance};

/// Most history rows ever taken from the results table.
const MAX_RESULTS: usize = 5;

/// Raw output of one horse-history document.
#[derive(Debug, Clone, Default)]
pub struct ParsedHistory {
    /// HTML-derived results, most recent first, dated rows only.
    pub results: Vec<RaceResultDetail>,
    pub first_up: Option<SpellPerformance>,
    pub second_up: Option<SpellPerformance>,
    pub trial_sectionals: Vec<f64>,
    pub career: Option<PerformanceStats>,
    pub track_stats: Option<PerformanceStats>,
    pub distance_stats: Option<PerformanceStats>,
    pub track_distance_stats: Option<PerformanceStats>,
    pub condition_stats: Option<ConditionStats>,
}

/// Parser for horse full-form documents
pub struct HorseHistoryParser;

impl HorseHistoryParser {
    /// Parse a horse-history document.
    ///
    /// Returns `None` when the canonical results table is missing: the
    /// horse has no real form data and is excluded from scoring.
    pub fn parse(html: &str, horse_name: &str) -> Option<ParsedHistory> {
        let document = Html::parse_document(html);

        let table_selector = Selector::parse("table.horse-form-table").ok()?;
        let table = document.select(&table_selector).next()?;

        let mut history = ParsedHistory::default();
        let exclusions = vec![horse_name.to_string()];

        let row_selector = Selector::parse("tr").unwrap();
        for (i, row) in table.select(&row_selector).enumerate() {
            if i == 0 {
                continue; // header row
            }
            if history.results.len() >= MAX_RESULTS {
                break;
            }

            let text = element_text(&row);
            if is_trial_row(&text) {
                if let Some(sectional) = extract_sectional(&text) {
                    history.trial_sectionals.push(sectional);
                }
                continue;
            }

            let Some(detail) = parse_result_row(&text, &exclusions) else {
                continue;
            };
            // Undated rows are same-day entries not yet run, not history.
            if detail.date.is_none() {
                debug!(position = detail.position, "dropping undated history row");
                continue;
            }
            history.results.push(detail);
        }

        let doc_text = document.root_element().text().collect::<Vec<_>>().join(" ");

        history.first_up = extract_labelled_record(&doc_text, r"1st\s*Up:").map(to_spell);
        history.second_up = extract_labelled_record(&doc_text, r"2nd\s*Up:").map(to_spell);
        history.career = extract_labelled_record(&doc_text, r"Career:");

        let stats_text = stats_scope_text(&document).unwrap_or(doc_text.clone());
        history.track_stats = extract_labelled_record(&stats_text, r"Track:");
        history.distance_stats = extract_labelled_record(&stats_text, r"(?:^|[^/])Dist:");
        history.track_distance_stats = extract_labelled_record(&stats_text, r"Track/Dist:");
        history.condition_stats = extract_condition_stats(&doc_text);

        Some(history)
    }
}

/// Trial and jump-out rows never count as race history.
fn is_trial_row(text: &str) -> bool {
    if text.contains("Trial") || text.contains("JumpOut") || text.contains("Jump Out") {
        return true;
    }
    let first = text.split_whitespace().next().unwrap_or("");
    let prefix_re = Regex::new(r"^[TJ]\d+$").unwrap();
    prefix_re.is_match(first)
}

/// Parse one results-table row from its flattened text.
fn parse_result_row(text: &str, exclusions: &[String]) -> Option<RaceResultDetail> {
    let position = extract_position(text)?;

    Some(RaceResultDetail {
        position,
        margin: extract_margin(text),
        track: extract_track_code(text).unwrap_or_default(),
        distance: extract_distance(text),
        condition: extract_condition(text),
        sectional_600m: extract_sectional(text),
        date: extract_date(text),
        jockey: extract_person(text, &[r"J:\s*", r"Jockey:\s*"], exclusions).unwrap_or_default(),
        trainer: extract_person(text, &[r"T:\s*", r"Trainer:\s*"], exclusions).unwrap_or_default(),
        class: extract_class(text).unwrap_or_default(),
    })
}

/// Five cascading position patterns, tried in fixed order.
fn extract_position(text: &str) -> Option<u32> {
    let patterns = [
        r"(\d{1,2})(?:st|nd|rd|th)\s+of\s+\d+",
        r"(\d{1,2})\s*/\s*\d+",
        r"(\d{1,2})\s+of\s+\d+",
        r"\b(\d{1,2})(?:st|nd|rd|th)\b",
        r"^\s*(\d{1,2})\b",
    ];

    for (i, pattern) in patterns.iter().enumerate() {
        let re = Regex::new(pattern).unwrap();
        if let Some(caps) = re.captures(text) {
            let position: u32 = caps[1].parse().ok()?;
            if position == 0 {
                continue;
            }
            // The bare leading number is only trusted in field range.
            if i == 4 && !(1..=20).contains(&position) {
                continue;
            }
            return Some(position);
        }
    }
    None
}

fn extract_date(text: &str) -> Option<NaiveDate> {
    let re = Regex::new(r"\b(\d{1,2}[A-Z][a-z]{2,3}\d{2})\b").unwrap();
    let token = re.captures(text)?.get(1)?.as_str().to_string();
    NaiveDate::parse_from_str(&normalize_month(&token), "%d%b%y").ok()
}

fn extract_track_code(text: &str) -> Option<String> {
    // After the field size first, then the first standalone caps token.
    let after_field = Regex::new(r"of\s+\d+\s+([A-Z][A-Za-z]{1,4})\b").unwrap();
    if let Some(caps) = after_field.captures(text) {
        return Some(caps[1].to_string());
    }

    let caps_token = Regex::new(r"\b([A-Z]{2,5})\b").unwrap();
    caps_token.captures(text).map(|c| c[1].to_string())
}

fn extract_distance(text: &str) -> Option<u32> {
    for pattern in [r"(\d{3,4})m\b", r"(?i)(\d{3,4})\s*metres"] {
        let re = Regex::new(pattern).unwrap();
        if let Some(caps) = re.captures(text) {
            return caps[1].parse().ok();
        }
    }
    None
}

fn extract_condition(text: &str) -> Option<String> {
    let re = Regex::new(r"\b(Good|Soft|Heavy|Firm|Synthetic)(\d?)\b").unwrap();
    let caps = re.captures(text)?;
    Some(format!("{}{}", &caps[1], &caps[2]))
}

fn extract_class(text: &str) -> Option<String> {
    let re = Regex::new(
        r"\b(G[123]|LR|Listed|BM\d+|CL[1-6]|Class\s?[1-6]|MDN|Maiden|OPEN|Open|HCP|Hcp)\b",
    )
    .unwrap();
    re.captures(text).map(|caps| caps[1].to_string())
}

fn extract_margin(text: &str) -> Option<f64> {
    for pattern in [r"(\d+(?:\.\d+)?)L\b", r"Mgn\s*(\d+(?:\.\d+)?)"] {
        let re = Regex::new(pattern).unwrap();
        if let Some(caps) = re.captures(text) {
            return caps[1].parse().ok();
        }
    }
    None
}

fn extract_sectional(text: &str) -> Option<f64> {
    for pattern in [
        r"600m?\s*[: ]\s*(\d{2}(?:\.\d+)?)",
        r"L600\s*(\d{2}(?:\.\d+)?)",
    ] {
        let re = Regex::new(pattern).unwrap();
        if let Some(caps) = re.captures(text) {
            return caps[1].parse().ok();
        }
    }
    None
}

/// Labelled rider/trainer extraction with a structural name-shape check.
fn extract_person(text: &str, labels: &[&str], exclusions: &[String]) -> Option<String> {
    for label in labels {
        let pattern = format!(
            r"{label}([A-Z][A-Za-z'\-]*(?:\s+[A-Z][A-Za-z'\-]*){{1,2}})"
        );
        let re = Regex::new(&pattern).unwrap();
        for caps in re.captures_iter(text) {
            // The greedy match may swallow a following one-letter label
            // ("T:" loses its colon); trim trailing single letters.
            let mut words: Vec<&str> = caps[1].split_whitespace().collect();
            while words.len() > 2 && words.last().is_some_and(|w| w.len() == 1) {
                words.pop();
            }
            let candidate = words.join(" ");
            if is_person_name(&candidate, exclusions) {
                return Some(candidate);
            }
        }
    }
    None
}

fn extract_labelled_record(text: &str, label: &str) -> Option<PerformanceStats> {
    let pattern = format!(r"{label}\s*(\d+:\d+-\d+-\d+)");
    let re = Regex::new(&pattern).unwrap();
    let caps = re.captures(text)?;
    parse_record(&caps[1])
}

fn to_spell(stats: PerformanceStats) -> SpellPerformance {
    SpellPerformance {
        runs: stats.runs,
        wins: stats.wins,
        seconds: stats.seconds,
        thirds: stats.thirds,
    }
}

/// Try the dedicated stats containers before the whole document.
fn stats_scope_text(document: &Html) -> Option<String> {
    for selector_str in [".race-stats", ".horse-stats", ".form-summary"] {
        if let Ok(selector) = Selector::parse(selector_str) {
            let text: Vec<String> = document
                .select(&selector)
                .map(|el| element_text(&el))
                .collect();
            let joined = text.join(" ");
            if joined.contains("Track:") || joined.contains("Dist:") {
                return Some(joined);
            }
        }
    }
    None
}

/// Keep only the condition category with the most runs.
fn extract_condition_stats(text: &str) -> Option<ConditionStats> {
    let mut best: Option<ConditionStats> = None;
    for label in ["Good", "Soft", "Heavy", "Firm", "Synthetic"] {
        let Some(stats) = extract_labelled_record(text, &format!(r"{label}:")) else {
            continue;
        };
        let replace = best.as_ref().map_or(true, |b| stats.runs > b.stats.runs);
        if replace {
            best = Some(ConditionStats {
                condition: condition_category(label),
                stats,
            });
        }
    }
    best
}
