//! Request pacing for the catalog client.
//!
//! The catalog allows roughly 60 requests per minute; every outbound
//! request waits on a shared clock so consecutive calls are spaced by
//! at least the configured interval. Throttling responses (429) are
//! retried with exponential backoff up to a bounded number of attempts.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Configuration for catalog request pacing and 429 retries.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum spacing between consecutive outbound requests.
    pub min_interval: Duration,
    /// First backoff delay after a throttling response.
    pub backoff_base: Duration,
    /// Upper bound for the exponentially growing backoff delay.
    pub backoff_cap: Duration,
    /// Retries after the initial attempt before giving up.
    pub max_retries: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        // 1100ms keeps us just under 60 requests/minute
        Self {
            min_interval: Duration::from_millis(1100),
            backoff_base: Duration::from_millis(5000),
            backoff_cap: Duration::from_millis(30000),
            max_retries: 3,
        }
    }
}

/// Shared clock enforcing a minimum interval between requests.
///
/// One instance is owned by the catalog client; all endpoints await
/// `wait()` before issuing a request, so pacing holds across search and
/// detail calls alike.
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Sleep until the minimum interval since the previous request has
    /// elapsed, then claim the slot.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Exponential backoff schedule for throttling responses.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base: Duration,
    cap: Duration,
    max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration, max_retries: u32) -> Self {
        Self {
            base,
            cap,
            max_retries,
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.backoff_base, config.backoff_cap, config.max_retries)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based): base * 2^(retry-1),
    /// capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        let factor = 1u64 << exponent;
        let delay = self.base.saturating_mul(factor as u32);
        delay.min(self.cap)
    }
}
