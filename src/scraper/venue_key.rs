//! Composite venue key codec.
//!
//! Calendar links identify a meeting with a `Key` query parameter of the
//! grammar `<DateToken>,<State>,<VenueName>` where the date token is
//! `yyyy` + 3-letter English month abbreviation + `dd` (e.g. `2025Aug27`)
//! and spaces/commas inside components are percent-escaped.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Decoded composite venue key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueKey {
    pub date: NaiveDate,
    pub state: String,
    pub venue: String,
}

impl VenueKey {
    /// Decode a raw `Key` parameter value.
    ///
    /// Undoes percent-style escaping of spaces and commas, then splits on
    /// the comma delimiter. Returns `None` when the key does not have
    /// three non-empty components or the date token does not parse.
    pub fn decode(raw: &str) -> Option<Self> {
        let unescaped = unescape(raw);
        let mut parts = unescaped.splitn(3, ',');
        let date_token = parts.next()?.trim();
        let state = parts.next()?.trim();
        let venue = parts.next()?.trim();

        if date_token.is_empty() || state.is_empty() || venue.is_empty() {
            return None;
        }

        let date = parse_date_token(date_token)?;

        Some(Self {
            date,
            state: state.to_string(),
            venue: venue.to_string(),
        })
    }

    /// Encode back to the percent-escaped `Key` parameter form.
    pub fn encode(&self) -> String {
        format!(
            "{},{},{}",
            date_token(self.date),
            escape(&self.state),
            escape(&self.venue)
        )
    }

    /// The raw date token component, e.g. `2025Aug27`.
    pub fn date_token(&self) -> String {
        date_token(self.date)
    }
}

impl std::fmt::Display for VenueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", date_token(self.date), self.state, self.venue)
    }
}

/// Render a date as a calendar date token, e.g. `2025Aug27`.
pub fn date_token(date: NaiveDate) -> String {
    format!("{}{}{:02}", date.year(), month_abbrev(date.month()), date.day())
}

/// Parse a date token, tolerating the site's four-letter "Sept".
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let normalized = normalize_month(token);
    NaiveDate::parse_from_str(&normalized, "%Y%b%d").ok()
}

/// Normalize month abbreviations so that "Sept" and "Sep" compare equal.
pub fn normalize_month(token: &str) -> String {
    token.replace("Sept", "Sep")
}

fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        _ => "Dec",
    }
}

fn unescape(s: &str) -> String {
    s.replace("%20", " ").replace("%2C", ",").replace("%2c", ",")
}

fn escape(s: &str) -> String {
    s.replace(',', "%2C").replace(' ', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_simple_key() {
        let key = VenueKey::decode("2025Aug27,NSW,Royal%20Randwick").unwrap();
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2025, 8, 27).unwrap());
        assert_eq!(key.state, "NSW");
        assert_eq!(key.venue, "Royal Randwick");
    }

    #[test]
    fn test_decode_sept_variant() {
        let key = VenueKey::decode("2025Sept03,VIC,Flemington").unwrap();
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2025, 9, 3).unwrap());
    }

    #[test]
    fn test_decode_rejects_incomplete_key() {
        assert!(VenueKey::decode("2025Aug27,NSW").is_none());
        assert!(VenueKey::decode("garbage,NSW,Somewhere").is_none());
        assert!(VenueKey::decode("2025Aug27,,Somewhere").is_none());
    }

    #[test]
    fn test_encode_round_trip() {
        let key = VenueKey::decode("2025Aug27,NSW,Royal%20Randwick").unwrap();
        assert_eq!(key.encode(), "2025Aug27,NSW,Royal%20Randwick");
    }

    #[test]
    fn test_date_token_renders_september_short() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 3).unwrap();
        assert_eq!(date_token(date), "2025Sep03");
    }
}
