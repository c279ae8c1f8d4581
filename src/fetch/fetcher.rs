//! Retrying feed fetcher.

use std::future::Future;

use async_trait::async_trait;
use reqwest::header;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, warn};

use super::client::create_http_client;
use super::types::FetchConfig;
use super::util::decode_body;
use crate::error::FetchError;
use crate::TARGET_WEB_REQUEST;

/// Anything that can produce the raw bytes of a feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP feed fetcher with linear backoff between attempts.
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

/// Delay before retrying after attempt number `attempt` (1-based).
pub fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    base.saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = create_http_client(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// One GET bounded by the configured timeout, body included.
    async fn attempt(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let request = async {
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
                    status: status.as_u16(),
                });
            }

            // Extract the content encoding before consuming the response
            let content_encoding = response
                .headers()
                .get(header::CONTENT_ENCODING)
                .and_then(|value| value.to_str().ok())
                .map(|s| s.to_lowercase());

            let bytes = response
                .bytes()
                .await
                .map_err(|source| FetchError::Request {
                    url: url.to_string(),
                    source,
                })?;

            debug!(target: TARGET_WEB_REQUEST, "Received {} bytes from {} (status {})", bytes.len(), url, status);
            Ok(decode_body(&bytes, content_encoding.as_deref(), url))
        };

        match timeout(self.config.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: self.config.timeout,
            }),
        }
    }
}

/// Run `op` until it succeeds or `max_attempts` are spent, sleeping
/// [`backoff_delay`] between attempts. No sleep follows the final attempt.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    url: &str,
    max_attempts: usize,
    retry_delay: Duration,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        info!(target: TARGET_WEB_REQUEST, "Loading feed from {} (attempt {}/{})", url, attempt, max_attempts);

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                error!(target: TARGET_WEB_REQUEST, "Max retries reached for {}: {}", url, err);
                return Err(err);
            }
            Err(err) => {
                let delay = backoff_delay(retry_delay, attempt);
                warn!(target: TARGET_WEB_REQUEST, "[RETRY {}] {} -> {}, retrying in {:?}", attempt, url, err, delay);
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[async_trait]
impl FeedSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        retry_with_backoff(url, self.config.max_attempts, self.config.retry_delay, || {
            self.attempt(url)
        })
        .await
    }
}
