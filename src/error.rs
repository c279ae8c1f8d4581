//! Error types for feed-mirror.
//!
//! Per-feed failures ([`FetchError`], [`PublishError`]) are recovered by the
//! pipeline. [`ConfigError`] and [`MirrorError`] end the run.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The feed list could not be turned into descriptors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An entry parsed but is unusable (bad URL, unsafe path, duplicate file...)
    #[error("invalid feed entry #{index} ({name}): {reason}")]
    InvalidEntry {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

/// A feed could not be fetched after every attempt was spent.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Writing a destination file failed.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublishError {
    pub fn path(&self) -> &PathBuf {
        match self {
            PublishError::Read { path, .. } | PublishError::Write { path, .. } => path,
        }
    }
}

/// Whole-run failures.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create output directory {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write index")]
    Index(#[source] PublishError),
}
