//! Premiership table parser for jockey and trainer state rankings.
//!
//! The table carries one header row; data rows are ranked by their
//! source order, top twenty only, with a fixed nine-column layout:
//! name, wins, 2nds, 3rds, 4ths, 5ths, prize money, strike rate, starts.

use scraper::{Html, Selector};

use super::element_text;
use crate::types::PremiershipEntry;

/// Most ranked rows kept from a premiership table.
const MAX_RANKED: usize = 20;

/// Parser for premiership documents
pub struct PremiershipParser;

impl PremiershipParser {
    /// Parse the ranked entries out of a premiership document.
    pub fn parse(html: &str) -> Vec<PremiershipEntry> {
        let document = Html::parse_document(html);
        let mut entries = Vec::new();

        let Ok(table_selector) = Selector::parse("table") else {
            return entries;
        };
        let row_selector = Selector::parse("tr").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        for table in document.select(&table_selector) {
            for (i, row) in table.select(&row_selector).enumerate() {
                if i == 0 {
                    continue; // header row
                }
                if entries.len() >= MAX_RANKED {
                    break;
                }

                let cells: Vec<String> = row
                    .select(&cell_selector)
                    .map(|c| element_text(&c))
                    .collect();
                if cells.len() < 8 {
                    continue;
                }

                let name = cells[0].trim().to_string();
                if name.is_empty() {
                    continue;
                }

                let wins = parse_count(&cells[1]);
                let seconds = parse_count(&cells[2]);
                let thirds = parse_count(&cells[3]);
                let fourths = parse_count(&cells[4]);
                let fifths = parse_count(&cells[5]);
                let prize_money = parse_money(&cells[6]);
                let strike_rate = parse_float(&cells[7]);
                let total_starts = cells.get(8).map(|c| parse_count(c)).unwrap_or(0);

                let places = seconds + thirds;
                let points = 3 * wins + 2 * seconds + thirds;
                let win_percentage = if total_starts > 0 {
                    wins as f64 / total_starts as f64 * 100.0
                } else {
                    0.0
                };

                entries.push(PremiershipEntry {
                    name,
                    rank: entries.len() as u32 + 1,
                    wins,
                    seconds,
                    thirds,
                    fourths,
                    fifths,
                    prize_money,
                    strike_rate,
                    total_starts,
                    places,
                    points,
                    win_percentage,
                });
            }

            if !entries.is_empty() {
                break;
            }
        }

        entries
    }
}

fn parse_count(text: &str) -> u32 {
    text.replace(',', "").trim().parse().unwrap_or(0)
}

fn parse_float(text: &str) -> f64 {
    text.trim().trim_end_matches('%').parse().unwrap_or(0.0)
}

fn parse_money(text: &str) -> f64 {
    text.replace(['$', ','], " ")
        .split_whitespace()
        .collect::<String>()
        .parse()
        .unwrap_or(0.0)
}
