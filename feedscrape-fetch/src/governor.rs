//! Fixed-budget rate-limit governor.
//!
//! After every `request_threshold` page requests the governor suspends the
//! whole run for `pause`. It never looks at the platform's rate-limit
//! headers; the budget is static.

use std::time::Duration;
use tracing::info;

/// Default number of requests between pauses.
pub const DEFAULT_REQUEST_THRESHOLD: u32 = 140;

/// Default pause length (15 minutes).
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(15 * 60);

/// Request budget of the governor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Number of requests after which the governor pauses.
    pub request_threshold: u32,
    /// How long to pause.
    pub pause: Duration,
}

impl RateLimitPolicy {
    /// Creates a policy.
    pub fn new(request_threshold: u32, pause: Duration) -> Self {
        Self {
            request_threshold,
            pause,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_THRESHOLD, DEFAULT_PAUSE)
    }
}

/// Suspends progress once the request budget is used up.
#[derive(Debug, Clone)]
pub struct RateLimitGovernor {
    policy: RateLimitPolicy,
    pauses: u32,
}

impl RateLimitGovernor {
    /// Creates a governor for the given policy.
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self { policy, pauses: 0 }
    }

    /// Returns true once `requests_made` reaches the threshold.
    pub fn should_pause(&self, requests_made: u32) -> bool {
        requests_made >= self.policy.request_threshold
    }

    /// Sleeps for the configured pause.
    ///
    /// `total_fetched` is only reported in the log line.
    pub async fn pause(&mut self, total_fetched: u64) {
        info!(
            requests = self.policy.request_threshold,
            total_fetched,
            pause_secs = self.policy.pause.as_secs(),
            "Request budget reached, pausing"
        );

        tokio::time::sleep(self.policy.pause).await;
        self.pauses += 1;

        info!("Resuming after pause");
    }

    /// Number of pauses taken so far.
    pub fn pauses(&self) -> u32 {
        self.pauses
    }
}

impl Default for RateLimitGovernor {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}
