//! HTTP client creation for feed requests.

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::debug;

use super::types::{FetchConfig, ACCEPT, ACCEPT_ENCODING};
use crate::error::FetchError;
use crate::TARGET_WEB_REQUEST;

/// Create the client used for every attempt of a run.
///
/// Bodies are never decoded by the client: we ask for `gzip, deflate` ourselves
/// and decode in [`decode_body`](super::decode_body), which can fall back to
/// the raw bytes when a server mislabels its encoding.
pub fn create_http_client(config: &FetchConfig) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static(ACCEPT_ENCODING),
    );

    debug!(target: TARGET_WEB_REQUEST, "Creating HTTP client with user agent {}", config.user_agent);

    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(FetchError::Client)
}
