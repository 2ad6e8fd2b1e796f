//! Race field parser: locates per-race containers in a track document
//! and extracts race header metadata.
//!
//! Containers are found by an ordered fallback of selection strategies;
//! the first strategy yielding any containers wins and the result is
//! capped at ten races.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::horse_row;
use crate::types::{Race, Track};

/// Most races a single track document may yield.
const MAX_RACES: usize = 10;

/// A candidate race container: the header text it was paired with (if
/// any) and the element holding the runner rows.
struct RaceBlock<'a> {
    header_text: Option<String>,
    body: ElementRef<'a>,
}

/// Parser for track field documents
pub struct RaceFieldsParser;

impl RaceFieldsParser {
    /// Extract the races (with their fields) from a track document.
    pub fn parse(html: &str, track: &Track) -> Vec<Race> {
        let document = Html::parse_document(html);

        // Condition is a per-document property, not per-race.
        let condition = track_condition(&document);

        let header_re = race_header_regex();
        let mut races = Vec::new();

        for block in find_race_blocks(&document) {
            let Some(header_text) = block
                .header_text
                .clone()
                .or_else(|| find_header_text(&block.body, &header_re))
            else {
                continue;
            };

            let Some(caps) = header_re.captures(&header_text) else {
                continue;
            };

            let number: u32 = match caps[1].parse() {
                Ok(n) if (1..=10).contains(&n) => n,
                _ => continue,
            };
            let start_time = format!("{}{}", &caps[2], &caps[3]);
            let name = caps[4].trim().to_string();
            let distance: u32 = match caps[5].parse() {
                Ok(d) if d > 0 => d,
                _ => continue,
            };

            let block_text = super::element_text(&block.body);
            let horses = horse_row::extract_horses(&block.body);
            if horses.is_empty() {
                debug!(race = number, "discarding race with no extractable horses");
                continue;
            }

            races.push(Race {
                number,
                name,
                start_time,
                distance,
                surface: detect_surface(&block_text, &condition),
                condition: condition.clone(),
                class: detect_class(&header_text, &block_text),
                date: track.date,
                horses,
            });
        }

        races
    }
}

fn race_header_regex() -> Regex {
    Regex::new(r"(?i)Race\s+(\d+)\s*-\s*(\d{1,2}:\d{2})\s*(AM|PM)\s+(.+?)\s*\((\d+)\s*METRES?\)")
        .unwrap()
}

/// Ordered container-selection cascade. Strategy A pairs a race-title
/// container with the immediately following fields container; the four
/// fallback strategies produce single containers that must hold their
/// own header element.
fn find_race_blocks(document: &Html) -> Vec<RaceBlock<'_>> {
    let mut blocks = strategy_title_fields(document);

    if blocks.is_empty() {
        let fallbacks: [fn(&Html) -> Vec<ElementRef<'_>>; 4] = [
            strategy_race_class_tables,
            strategy_race_class_divs,
            strategy_race_like_tables,
            strategy_heuristic_divs,
        ];
        for strategy in fallbacks {
            let containers = strategy(document);
            if !containers.is_empty() {
                blocks = containers
                    .into_iter()
                    .map(|body| RaceBlock {
                        header_text: None,
                        body,
                    })
                    .collect();
                break;
            }
        }
    }

    blocks.truncate(MAX_RACES);
    blocks
}

/// Strategy A: `.race-title` container followed by a fields container.
fn strategy_title_fields(document: &Html) -> Vec<RaceBlock<'_>> {
    let Ok(title_selector) = Selector::parse(".race-title") else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for title in document.select(&title_selector) {
        let Some(body) = title.next_siblings().find_map(ElementRef::wrap) else {
            continue;
        };
        blocks.push(RaceBlock {
            header_text: Some(super::element_text(&title)),
            body,
        });
    }
    blocks
}

fn strategy_race_class_tables(document: &Html) -> Vec<ElementRef<'_>> {
    select_all(document, "table[class*='race']")
}

fn strategy_race_class_divs(document: &Html) -> Vec<ElementRef<'_>> {
    select_all(document, "div[class*='race']")
}

/// Any table whose text looks race-like.
fn strategy_race_like_tables(document: &Html) -> Vec<ElementRef<'_>> {
    const KEYWORDS: [&str; 4] = ["Race", "Field", "Horse", "Runner"];
    select_all(document, "table")
        .into_iter()
        .filter(|table| {
            let text = super::element_text(table);
            KEYWORDS.iter().any(|kw| text.contains(kw))
        })
        .collect()
}

/// Divs with at least three lines, each mixing digits with real words.
fn strategy_heuristic_divs(document: &Html) -> Vec<ElementRef<'_>> {
    select_all(document, "div")
        .into_iter()
        .filter(|div| {
            let lines: Vec<String> = div
                .text()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            lines.len() >= 3
                && lines.iter().all(|line| {
                    line.chars().any(|c| c.is_ascii_digit())
                        && line
                            .split_whitespace()
                            .any(|w| w.len() >= 3 && w.chars().all(|c| c.is_alphabetic()))
                })
        })
        .collect()
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => document.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

/// Locate a header element inside a fallback container.
fn find_header_text(container: &ElementRef, header_re: &Regex) -> Option<String> {
    let selector = Selector::parse("th, caption, h2, h3, strong, td, span, div").ok()?;
    for element in container.select(&selector) {
        let text = super::element_text(&element);
        if header_re.is_match(&text) {
            return Some(text);
        }
    }
    None
}

/// Extract the per-document track condition. The default of "Good"
/// applies only when no "Track Condition:" label exists anywhere.
fn track_condition(document: &Html) -> String {
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");
    let re = Regex::new(r"Track Condition:\s*([A-Za-z]+\d?)").unwrap();
    match re.captures(&text) {
        Some(caps) => caps[1].to_string(),
        None => "Good".to_string(),
    }
}

fn detect_surface(block_text: &str, condition: &str) -> String {
    if block_text.contains("Synthetic")
        || block_text.contains("Polytrack")
        || condition.starts_with("Synthetic")
    {
        "Synthetic".to_string()
    } else {
        "Turf".to_string()
    }
}

fn detect_class(header_text: &str, block_text: &str) -> Option<String> {
    let re = Regex::new(
        r"\b(Group [123]|Listed|BM\d+|Benchmark \d+|Class [1-6]|Maiden|Open|Handicap|Hcp)\b",
    )
    .unwrap();
    re.captures(header_text)
        .or_else(|| re.captures(block_text))
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn track() -> Track {
        Track {
            name: "Royal Randwick".to_string(),
            state: "NSW".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, 27).unwrap(),
            race_count: 2,
            fields_url: String::new(),
        }
    }

    fn horse_row(n: u32, name: &str, code: &str) -> String {
        format!(
            r#"<tr class="runner-row">
              <td class="saddle-number">{n}</td>
              <td><a href="/Horses/HorseFullForm.aspx?horsecode={code}&racecode=R{n}">{name}</a></td>
              <td class="trainer">C Waller</td>
              <td class="jockey">J McDonald</td>
              <td class="barrier">{n}</td>
              <td class="weight">57.5kg</td>
              <td class="last-form">21x43</td>
            </tr>"#
        )
    }

    fn fields_page() -> String {
        format!(
            r#"<html><body>
            <div>Track Condition: Soft5</div>
            <table class="race-title"><tr><th>Race 1 - 1:45PM MAIDEN PLATE (1200 METRES)</th></tr></table>
            <table class="race-strip-fields">
              <tr><td>No</td><td>Horse</td><td>Trainer</td><td>Jockey</td><td>Barrier</td><td>Weight</td></tr>
              {}{}
            </table>
            <table class="race-title"><tr><th>Race 2 - 2:20PM BM72 HANDICAP (1400 METRES)</th></tr></table>
            <table class="race-strip-fields">
              <tr><td>No</td><td>Horse</td><td>Trainer</td><td>Jockey</td><td>Barrier</td><td>Weight</td></tr>
              {}
            </table>
            </body></html>"#,
            horse_row(1, "Fast Lane", "H1"),
            horse_row(2, "Night Parade", "H2"),
            horse_row(1, "Coastal Run", "H3"),
        )
    }

    #[test]
    fn test_parses_paired_title_and_fields() {
        let races = RaceFieldsParser::parse(&fields_page(), &track());
        assert_eq!(races.len(), 2);

        let first = &races[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.name, "MAIDEN PLATE");
        assert_eq!(first.start_time, "1:45PM");
        assert_eq!(first.distance, 1200);
        assert_eq!(first.condition, "Soft5");
        assert_eq!(first.horses.len(), 2);

        let second = &races[1];
        assert_eq!(second.number, 2);
        assert_eq!(second.distance, 1400);
        assert_eq!(second.class.as_deref(), Some("BM72"));
    }

    #[test]
    fn test_condition_defaults_to_good_without_label() {
        let html = fields_page().replace("Track Condition: Soft5", "");
        let races = RaceFieldsParser::parse(&html, &track());
        assert!(races.iter().all(|r| r.condition == "Good"));
    }

    #[test]
    fn test_header_grammar_mismatch_discards_container() {
        let html = fields_page().replace(
            "Race 2 - 2:20PM BM72 HANDICAP (1400 METRES)",
            "Second race of the day",
        );
        let races = RaceFieldsParser::parse(&html, &track());
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].number, 1);
    }

    #[test]
    fn test_race_with_no_horses_is_discarded() {
        let html = format!(
            r#"<html><body>
            <table class="race-title"><tr><th>Race 1 - 1:45PM EMPTY PLATE (1200 METRES)</th></tr></table>
            <table class="race-strip-fields">
              <tr><td>No</td><td>Horse</td><td>Trainer</td><td>Jockey</td><td>Barrier</td><td>Weight</td></tr>
            </table>
            </body></html>"#
        );
        let races = RaceFieldsParser::parse(&html, &track());
        assert!(races.is_empty());
    }

    #[test]
    fn test_fallback_table_strategy_used_when_no_title_containers() {
        let html = format!(
            r#"<html><body>
            <table class="race-fields-alt">
              <tr><th>Race 3 - 3:05PM SPRINT (1000 METRES)</th></tr>
              <tr><td>No</td><td>Horse</td><td>Trainer</td><td>Jockey</td><td>Barrier</td><td>Weight</td></tr>
              {}
            </table>
            </body></html>"#,
            horse_row(4, "Gale Force", "H9"),
        );
        let races = RaceFieldsParser::parse(&html, &track());
        assert_eq!(races.len(), 1);
        assert_eq!(races[0].number, 3);
        assert_eq!(races[0].distance, 1000);
    }

    #[test]
    fn test_empty_document_yields_no_races() {
        let races = RaceFieldsParser::parse("<html></html>", &track());
        assert!(races.is_empty());
    }
}
