//! Type definitions for the fetch module.

use tokio::time::Duration;

// Constants
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const RETRY_DELAY: Duration = Duration::from_millis(1500);
pub const MAX_RETRIES: usize = 3;

pub const USER_AGENT: &str = "Mozilla/5.0 (RSS-Proxy; +https://github.com)";
pub const ACCEPT: &str = "application/rss+xml, application/xml;q=0.9, */*;q=0.8";
pub const ACCEPT_ENCODING: &str = "gzip, deflate";

/// Settings for a [`Fetcher`](super::Fetcher).
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Deadline for one attempt, covering the request and the body.
    pub timeout: Duration,
    /// Total attempts per feed, at least one.
    pub max_attempts: usize,
    /// Backoff after attempt `n` is `retry_delay * n`.
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: REQUEST_TIMEOUT,
            max_attempts: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
            user_agent: USER_AGENT.to_string(),
        }
    }
}
