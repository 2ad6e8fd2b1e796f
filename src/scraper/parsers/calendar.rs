//! Calendar parser: discovers the venues racing on a requested date.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::scraper::{track_fields_url, venue_key::VenueKey};
use crate::types::Track;

/// Parser for the monthly race calendar page
pub struct CalendarParser;

impl CalendarParser {
    /// Extract the tracks racing on `date`.
    ///
    /// Scans every anchor carrying a venue-key parameter, decodes the
    /// composite key and keeps the venues whose date token matches the
    /// requested date after month normalization. A calendar with no
    /// match anywhere yields an empty list, not an error.
    pub fn parse(html: &str, date: NaiveDate) -> Vec<Track> {
        let document = Html::parse_document(html);
        let mut tracks: Vec<Track> = Vec::new();

        let Ok(anchor_selector) = Selector::parse("a[href*='Key=']") else {
            return tracks;
        };

        for anchor in document.select(&anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(raw_key) = extract_key_param(href) else {
                continue;
            };
            let Some(key) = VenueKey::decode(&raw_key) else {
                continue;
            };

            if key.date != date {
                continue;
            }

            // The same meeting may carry both a fields anchor and a
            // results anchor; keep one track per venue.
            if tracks
                .iter()
                .any(|t| t.state == key.state && t.name == key.venue)
            {
                continue;
            }

            let race_count = count_races_near(&anchor);
            debug!(venue = %key.venue, state = %key.state, race_count, "calendar venue matched");

            // Always the pre-race fields link form, even when only a
            // results anchor was found.
            let fields_url = track_fields_url(&key);

            tracks.push(Track {
                name: key.venue,
                state: key.state,
                date: key.date,
                race_count,
                fields_url,
            });
        }

        tracks
    }
}

/// Pull the raw `Key` parameter value out of a link target.
fn extract_key_param(href: &str) -> Option<String> {
    let (_, query) = href.split_once('?')?;
    for pair in query.split('&') {
        let (name, value) = pair.split_once('=')?;
        if name.eq_ignore_ascii_case("key") {
            return Some(value.to_string());
        }
    }
    None
}

/// Count races by scanning numeric table cells in the anchor's row.
fn count_races_near(anchor: &ElementRef) -> u32 {
    let td_selector = Selector::parse("td").unwrap();

    for ancestor in anchor.ancestors() {
        let Some(element) = ElementRef::wrap(ancestor) else {
            continue;
        };
        if element.value().name() != "tr" {
            continue;
        }
        for cell in element.select(&td_selector) {
            let text = super::element_text(&cell);
            if let Ok(n) = text.parse::<u32>() {
                if (1..=20).contains(&n) {
                    return n;
                }
            }
        }
        break;
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALENDAR_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<table>
  <tr>
    <td><a href="/FreeFields/Form.aspx?Key=2025Aug27,NSW,Royal%20Randwick">Royal Randwick</a></td>
    <td>8</td>
  </tr>
  <tr>
    <td><a href="/FreeFields/Results.aspx?Key=2025Aug27,VIC,Flemington">Flemington</a></td>
    <td>9</td>
  </tr>
  <tr>
    <td><a href="/FreeFields/Form.aspx?Key=2025Aug28,QLD,Eagle%20Farm">Eagle Farm</a></td>
    <td>7</td>
  </tr>
  <tr>
    <td><a href="/FreeFields/Form.aspx?Key=2025Sept03,SA,Morphettville">Morphettville</a></td>
    <td>6</td>
  </tr>
</table>
</body>
</html>"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_filters_to_requested_date() {
        let tracks = CalendarParser::parse(CALENDAR_HTML, date(2025, 8, 27));
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].name, "Royal Randwick");
        assert_eq!(tracks[0].state, "NSW");
        assert_eq!(tracks[0].race_count, 8);
        assert_eq!(tracks[1].name, "Flemington");
    }

    #[test]
    fn test_results_anchor_still_yields_fields_link() {
        let tracks = CalendarParser::parse(CALENDAR_HTML, date(2025, 8, 27));
        let flemington = &tracks[1];
        assert!(flemington.fields_url.contains("Form.aspx"));
        assert!(!flemington.fields_url.contains("Results"));
    }

    #[test]
    fn test_sept_token_matches_normalized_date() {
        let tracks = CalendarParser::parse(CALENDAR_HTML, date(2025, 9, 3));
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "Morphettville");
        assert_eq!(tracks[0].race_count, 6);
    }

    #[test]
    fn test_no_match_yields_empty_list() {
        let tracks = CalendarParser::parse(CALENDAR_HTML, date(2025, 12, 25));
        assert!(tracks.is_empty());
        let tracks = CalendarParser::parse("<html><body></body></html>", date(2025, 8, 27));
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_duplicate_venue_anchors_dedupe() {
        let html = r#"<table>
          <tr><td><a href="Form.aspx?Key=2025Aug27,NSW,Gosford">Gosford</a></td><td>7</td></tr>
          <tr><td><a href="Results.aspx?Key=2025Aug27,NSW,Gosford">Gosford results</a></td><td>7</td></tr>
        </table>"#;
        let tracks = CalendarParser::parse(html, date(2025, 8, 27));
        assert_eq!(tracks.len(), 1);
    }
}
