pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod logging;
pub mod pipeline;
pub mod placeholder;
pub mod publish;
pub mod util;

pub use config::{FeedDescriptor, MirrorConfig};
pub use error::{ConfigError, FetchError, MirrorError, PublishError};
pub use fetch::{FeedSource, FetchConfig, Fetcher};
pub use pipeline::{Clock, FeedOutcome, FeedReport, Mirror, RunReport, SystemClock};

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_PUBLISH: &str = "publish";
pub const TARGET_CONFIG: &str = "config";
