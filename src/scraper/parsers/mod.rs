//! HTML parsers for the racing authority documents.
//!
//! Every parser follows the same discipline: an ordered cascade of
//! selection strategies, stop at the first non-empty result, and reject
//! a record outright when a mandatory field cannot be extracted.

pub mod calendar;
pub mod horse_history;
pub mod horse_row;
pub mod premiership;
pub mod race_fields;

pub use calendar::CalendarParser;
pub use horse_history::HorseHistoryParser;
pub use premiership::PremiershipParser;
pub use race_fields::RaceFieldsParser;

use regex::Regex;
use scraper::ElementRef;

use crate::types::PerformanceStats;

/// Collect the visible text of an element, whitespace-collapsed.
pub fn element_text(element: &ElementRef) -> String {
    let raw = element.text().collect::<Vec<_>>().join(" ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip apprentice-claim and weight parentheticals, bare numeric
/// parentheticals, and honorific/suffix tokens from a rider or trainer
/// name, e.g. "Ms K Smith (a1.5) (54kg)" -> "K Smith".
pub fn clean_person_name(raw: &str) -> String {
    let paren_re = Regex::new(r"\((?:a?\d+(?:\.\d+)?(?:kg)?|[^)]*kg)\)").unwrap();
    let cleaned = paren_re.replace_all(raw, " ");

    let honorifics = ["Mr", "Mrs", "Ms", "Miss", "Dr"];
    let suffixes = ["jnr", "snr", "jr", "sr"];

    let kept: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|token| {
            let bare = token.trim_matches(|c: char| c == '.' || c == ',');
            !honorifics.iter().any(|h| bare.eq_ignore_ascii_case(h))
                && !suffixes.iter().any(|s| bare.eq_ignore_ascii_case(s))
        })
        .collect();

    kept.join(" ").trim().to_string()
}

/// Structural name-shape check for jockey/trainer candidates pulled out
/// of free text: 2-3 title-case words, no stray punctuation, and not a
/// name on the exclusion list (known horse names in the same document).
pub fn is_person_name(candidate: &str, exclusions: &[String]) -> bool {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    if words.len() < 2 || words.len() > 3 {
        return false;
    }

    for word in &words {
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_ascii_uppercase() {
            return false;
        }
        if !word
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '\'' || c == '-')
        {
            return false;
        }
    }

    !exclusions
        .iter()
        .any(|ex| ex.eq_ignore_ascii_case(candidate))
}

/// Parse an `R:W-S-T` aggregate, e.g. "12:3-2-1".
pub fn parse_record(text: &str) -> Option<PerformanceStats> {
    let re = Regex::new(r"(\d+):(\d+)-(\d+)-(\d+)").unwrap();
    let caps = re.captures(text)?;
    Some(PerformanceStats {
        runs: caps[1].parse().ok()?,
        wins: caps[2].parse().ok()?,
        seconds: caps[3].parse().ok()?,
        thirds: caps[4].parse().ok()?,
    })
}

/// Base condition category of a condition token ("Soft5" -> "Soft").
pub fn condition_category(token: &str) -> String {
    token
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_string()
}

/// Synthetic placeholder names never become horses.
pub fn is_placeholder_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if ["tba", "tbc", "n/a", "unnamed", "vacant"].contains(&lowered.as_str()) {
        return true;
    }
    let placeholder_re = Regex::new(r"(?i)^(?:horse|runner)\s*\d*$").unwrap();
    placeholder_re.is_match(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_person_name_strips_claims_and_honorifics() {
        assert_eq!(clean_person_name("Ms K Smith (a1.5)"), "K Smith");
        assert_eq!(clean_person_name("Mr John Doe (54kg)"), "John Doe");
        assert_eq!(clean_person_name("B Jones jnr (2)"), "B Jones");
        assert_eq!(clean_person_name("James McDonald"), "James McDonald");
    }

    #[test]
    fn test_is_person_name_shape() {
        let exclusions = vec!["Winx Star".to_string()];
        assert!(is_person_name("James McDonald", &exclusions));
        assert!(is_person_name("Gai Waterhouse", &exclusions));
        assert!(!is_person_name("james mcdonald", &exclusions));
        assert!(!is_person_name("McDonald", &exclusions));
        assert!(!is_person_name("A B C D", &exclusions));
        assert!(!is_person_name("J. Smith", &exclusions));
        assert!(!is_person_name("Winx Star", &exclusions));
    }

    #[test]
    fn test_parse_record() {
        let stats = parse_record("Track: 12:3-2-1").unwrap();
        assert_eq!(stats.runs, 12);
        assert_eq!(stats.wins, 3);
        assert_eq!(stats.seconds, 2);
        assert_eq!(stats.thirds, 1);
        assert!(parse_record("no record here").is_none());
    }

    #[test]
    fn test_condition_category() {
        assert_eq!(condition_category("Soft5"), "Soft");
        assert_eq!(condition_category("Good"), "Good");
        assert_eq!(condition_category("Heavy10"), "Heavy");
    }

    #[test]
    fn test_is_placeholder_name() {
        assert!(is_placeholder_name(""));
        assert!(is_placeholder_name("TBA"));
        assert!(is_placeholder_name("Horse 7"));
        assert!(is_placeholder_name("unnamed"));
        assert!(!is_placeholder_name("Winx"));
    }
}
