//! Request pacing between fetches of the racing authority's pages.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Enforces a minimum spacing between consecutive requests, with a
/// small pseudo-random jitter on top so fetches do not tick like a
/// metronome.
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_spacing: Duration,
}

impl RateLimiter {
    pub fn new(min_spacing_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_spacing: Duration::from_millis(min_spacing_ms),
        }
    }

    /// Wait until the configured spacing since the previous request has
    /// passed, then claim the slot.
    pub async fn acquire(&self) {
        let wait = {
            let mut last = self.last_request.lock().await;
            let now = Instant::now();
            let spacing = self.min_spacing + jitter(self.min_spacing);

            let wait = match *last {
                Some(previous) => spacing.saturating_sub(now.duration_since(previous)),
                None => Duration::ZERO,
            };
            *last = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

/// Up to 25% of the base spacing, seeded from the clock.
fn jitter(base: Duration) -> Duration {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let factor = (nanos % 1000) as f64 / 1000.0;
    base.mul_f64(0.25 * factor)
}
