//! One mirroring run: fetch every feed, publish it or its placeholder, then
//! publish the index.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use tracing::{error, info};

use crate::config::{load_feeds, FeedDescriptor, MirrorConfig};
use crate::error::MirrorError;
use crate::fetch::FeedSource;
use crate::index::{build_index, IndexRow};
use crate::placeholder::placeholder;
use crate::publish::{content_digest, publish};
use crate::util::error_chain;
use crate::TARGET_PUBLISH;

/// Source of the current time for placeholders and the index.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What happened to one feed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedOutcome {
    Updated,
    Unchanged,
    PlaceholderWritten,
    PlaceholderUnchanged,
    /// Destination could not be written; the feed is left out of the index.
    WriteFailed,
}

impl FeedOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FeedOutcome::Updated => "UPDATED",
            FeedOutcome::Unchanged => "NOCHANGE",
            FeedOutcome::PlaceholderWritten => "PLACEHOLDER",
            FeedOutcome::PlaceholderUnchanged => "PLACEHOLDER-NOCHANGE",
            FeedOutcome::WriteFailed => "WRITE-FAILED",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            FeedOutcome::PlaceholderWritten | FeedOutcome::PlaceholderUnchanged
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedReport {
    pub name: String,
    pub file: String,
    pub outcome: FeedOutcome,
    /// SHA-256 of the bytes now at the destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub feeds: Vec<FeedReport>,
    pub index_changed: bool,
}

impl RunReport {
    pub fn count(&self, outcome: FeedOutcome) -> usize {
        self.feeds.iter().filter(|f| f.outcome == outcome).count()
    }

    pub fn changed_files(&self) -> usize {
        self.count(FeedOutcome::Updated)
            + self.count(FeedOutcome::PlaceholderWritten)
            + usize::from(self.index_changed)
    }
}

/// Mirrors feeds from `S` into the directories named by a [`MirrorConfig`].
pub struct Mirror<S, C = SystemClock> {
    source: S,
    clock: C,
    config: MirrorConfig,
}

impl<S: FeedSource> Mirror<S, SystemClock> {
    pub fn new(source: S, config: MirrorConfig) -> Self {
        Self::with_clock(source, SystemClock, config)
    }
}

impl<S: FeedSource, C: Clock> Mirror<S, C> {
    pub fn with_clock(source: S, clock: C, config: MirrorConfig) -> Self {
        Self {
            source,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Load the configured feed list and mirror it.
    pub async fn run(&self) -> Result<RunReport, MirrorError> {
        let feeds = load_feeds(&self.config.config_path)?;
        self.mirror_feeds(&feeds).await
    }

    /// Mirror `feeds` one after another, then rewrite the index if it changed.
    pub async fn mirror_feeds(&self, feeds: &[FeedDescriptor]) -> Result<RunReport, MirrorError> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| MirrorError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let started_at = self.clock.now();
        let link_prefix = self.config.link_prefix();
        let mut reports = Vec::with_capacity(feeds.len());
        let mut rows = Vec::with_capacity(feeds.len());

        for feed in feeds {
            let report = self.mirror_feed(feed, started_at, &link_prefix).await;
            if report.outcome != FeedOutcome::WriteFailed {
                rows.push(IndexRow {
                    name: feed.name.clone(),
                    file: feed.file.clone(),
                });
            }
            reports.push(report);
        }

        let html = build_index(&rows, &self.config.index_title, &link_prefix, started_at);
        let index_changed = publish(&self.config.index_path, &html).map_err(MirrorError::Index)?;
        info!(target: TARGET_PUBLISH, "[{}] index -> {}",
              if index_changed { "UPDATED" } else { "NOCHANGE" },
              self.config.index_path.display());

        Ok(RunReport {
            started_at,
            feeds: reports,
            index_changed,
        })
    }

    async fn mirror_feed(
        &self,
        feed: &FeedDescriptor,
        now: DateTime<Utc>,
        link_prefix: &str,
    ) -> FeedReport {
        let dest = self.config.destination(feed);
        let shown = if link_prefix.is_empty() {
            feed.file.clone()
        } else {
            format!("{}/{}", link_prefix, feed.file)
        };

        let (data, fetch_error) = match self.source.fetch(&feed.source).await {
            Ok(data) => (data, None),
            Err(err) => {
                let message = error_chain(&err);
                error!(target: TARGET_PUBLISH, "[ERROR] {}: {}", feed.name, message);
                (placeholder(&feed.name, &feed.source, &message, now), Some(message))
            }
        };

        let outcome = match (publish(&dest, &data), fetch_error.is_some()) {
            (Ok(true), false) => FeedOutcome::Updated,
            (Ok(false), false) => FeedOutcome::Unchanged,
            (Ok(true), true) => FeedOutcome::PlaceholderWritten,
            (Ok(false), true) => FeedOutcome::PlaceholderUnchanged,
            (Err(err), _) => {
                let message = error_chain(&err);
                error!(target: TARGET_PUBLISH, "[{}] {}: {}", FeedOutcome::WriteFailed.label(), feed.name, message);
                return FeedReport {
                    name: feed.name.clone(),
                    file: feed.file.clone(),
                    outcome: FeedOutcome::WriteFailed,
                    digest: None,
                    error: Some(message),
                };
            }
        };

        info!(target: TARGET_PUBLISH, "[{}] {} -> {}", outcome.label(), feed.name, shown);

        FeedReport {
            name: feed.name.clone(),
            file: feed.file.clone(),
            outcome,
            digest: Some(content_digest(&data)),
            error: fetch_error,
        }
    }
}
