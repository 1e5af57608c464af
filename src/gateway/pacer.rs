//! Request pacing for the single upstream API.
//!
//! All traffic targets one origin and is issued by one logical worker, so a
//! single "last request" slot is enough: each API request waits until the
//! configured minimum interval has elapsed since the previous one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Warning threshold for cumulative rate-limit backoff over a run (5 minutes).
const CUMULATIVE_BACKOFF_WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// Enforces a minimum spacing between API requests and tallies rate-limit backoff.
#[derive(Debug)]
pub struct RequestPacer {
    min_interval: Duration,
    /// `None` until the first request goes out (first request is immediate).
    last_request: Mutex<Option<Instant>>,
    cumulative_backoff_ms: AtomicU64,
}

impl RequestPacer {
    /// Creates a pacer; a zero interval disables spacing.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
            cumulative_backoff_ms: AtomicU64::new(0),
        }
    }

    /// Waits until the next request may be sent, then stamps the request time.
    #[instrument(level = "trace", skip(self))]
    pub async fn acquire(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        let mut last_request_guard = self.last_request.lock().await;
        if let Some(last_request) = *last_request_guard {
            let elapsed = last_request.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval.saturating_sub(elapsed);
                debug!(delay_ms = delay.as_millis(), "pacing API request");
                tokio::time::sleep(delay).await;
            }
        }
        *last_request_guard = Some(Instant::now());
    }

    /// Sleeps for a server-imposed backoff and records it in the run total.
    #[instrument(level = "debug", skip(self), fields(delay_ms = delay.as_millis()))]
    pub async fn backoff(&self, delay: Duration) {
        let cumulative = self.add_cumulative_backoff(delay);
        if cumulative >= CUMULATIVE_BACKOFF_WARNING_THRESHOLD {
            warn!(
                cumulative_backoff_secs = cumulative.as_secs(),
                "excessive rate limiting - consider raising the request delay"
            );
        }
        tokio::time::sleep(delay).await;
    }

    /// Total backoff slept so far.
    #[must_use]
    pub fn cumulative_backoff(&self) -> Duration {
        Duration::from_millis(self.cumulative_backoff_ms.load(Ordering::SeqCst))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_backoff(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let new_total = self
            .cumulative_backoff_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(new_total)
    }
}
