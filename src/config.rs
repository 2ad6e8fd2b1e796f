//! Configuration for the punter API.

use serde::{Deserialize, Serialize};

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Minimum delay between requests, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://racingaustralia.horse".to_string()
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Point-gap thresholds between the top two horses for each bet tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_tier_highest")]
    pub highest: f64,
    #[serde(default = "default_tier_high")]
    pub high: f64,
    #[serde(default = "default_tier_moderate")]
    pub moderate: f64,
}

fn default_tier_highest() -> f64 {
    8.0
}

fn default_tier_high() -> f64 {
    5.0
}

fn default_tier_moderate() -> f64 {
    3.0
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            highest: default_tier_highest(),
            high: default_tier_high(),
            moderate: default_tier_moderate(),
        }
    }
}

/// Scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Jockeys who always earn the full jockey-rank credit, regardless
    /// of premiership standing.
    #[serde(default = "default_champion_jockeys")]
    pub champion_jockeys: Vec<String>,
    #[serde(default)]
    pub tiers: TierThresholds,
}

fn default_champion_jockeys() -> Vec<String> {
    ["J McDonald", "James McDonald", "N Rawiller", "K McEvoy"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            champion_jockeys: default_champion_jockeys(),
            tiers: TierThresholds::default(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (PUNTER_SCRAPER_TIMEOUT_SECS, etc.)
            .add_source(
                config::Environment::with_prefix("PUNTER")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tier_thresholds_are_ordered() {
        let tiers = TierThresholds::default();
        assert!(tiers.highest > tiers.high);
        assert!(tiers.high > tiers.moderate);
        assert!(tiers.moderate > 0.0);
    }

    #[test]
    fn test_default_config_is_usable() {
        let config = AppConfig::default();
        assert!(config.scraper.base_url.starts_with("https://"));
        assert!(config.scraper.request_delay_ms > 0);
        assert!(!config.scoring.champion_jockeys.is_empty());
    }
}
