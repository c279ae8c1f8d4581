//! Feed fetching for feed-mirror.
//!
//! This module retrieves raw feed bytes over HTTP with bounded retries and
//! normalizes declared transfer encodings.

mod client;
mod fetcher;
mod types;
mod util;

pub use self::client::create_http_client;
pub use self::fetcher::{backoff_delay, FeedSource, Fetcher};
pub use self::types::*;
pub use self::util::{decode_body, is_valid_url};
