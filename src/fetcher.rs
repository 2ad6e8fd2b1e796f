//! Document retrieval: a fetch trait the pipeline depends on, plus the
//! rate-limited HTTP implementation.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::scraper::rate_limiter::RateLimiter;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Source of raw HTML documents. The pipeline never talks to the
/// network directly; tests substitute an in-memory implementation.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP fetcher with per-request pacing. Failed fetches are not
/// retried; the caller decides what a missing document means.
pub struct HttpFetcher {
    client: reqwest::Client,
    limiter: RateLimiter,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            limiter: RateLimiter::new(config.request_delay_ms),
        })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.limiter.acquire().await;
        debug!(url, "fetching document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages_carry_the_url() {
        let err = FetchError::Status {
            url: "https://racingaustralia.horse/FreeFields/Calendar.aspx".to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        };
        let message = err.to_string();
        assert!(message.contains("Calendar.aspx"));
        assert!(message.contains("404"));
    }
}
