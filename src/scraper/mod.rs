//! Web scraper module for the racing authority site.
//!
//! Provides URL construction, venue key encoding and HTML parsers.

pub mod parsers;
pub mod rate_limiter;
pub mod venue_key;

pub use rate_limiter::RateLimiter;
pub use venue_key::VenueKey;

/// Base URL for the racing authority site
pub const BASE_URL: &str = "https://racingaustralia.horse";

/// Build race calendar URL for a month
pub fn calendar_url(year: i32, month: u32) -> String {
    format!(
        "{}/FreeFields/Calendar_Meetings.aspx?State=ALL&Year={}&Month={}",
        BASE_URL, year, month
    )
}

/// Build pre-race fields URL for a meeting.
///
/// Always the `Form` document, never the post-race `Results` form.
pub fn track_fields_url(key: &VenueKey) -> String {
    format!("{}/FreeFields/Form.aspx?Key={}", BASE_URL, key.encode())
}

/// Build horse full-form (race history) URL
pub fn horse_form_url(horse_code: &str, race_entry: &str) -> String {
    format!(
        "{}/Horses/HorseFullForm.aspx?horsecode={}&racecode={}",
        BASE_URL, horse_code, race_entry
    )
}

/// Build jockey premiership table URL for a state
pub fn jockey_premiership_url(state: &str) -> String {
    format!(
        "{}/FreeServices/Premierships.aspx?Type=Jockey&State={}",
        BASE_URL, state
    )
}

/// Build trainer premiership table URL for a state
pub fn trainer_premiership_url(state: &str) -> String {
    format!(
        "{}/FreeServices/Premierships.aspx?Type=Trainer&State={}",
        BASE_URL, state
    )
}

/// Derived race-entry identifier used for local bookkeeping and logging.
pub fn race_entry_id(key: &VenueKey, race_number: u32) -> String {
    format!("{}_race{}", key.encode(), race_number)
}
