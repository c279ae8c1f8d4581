use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tokio::time::Duration;
use tracing::info;

use feed_mirror::config::{
    DEFAULT_CONFIG_PATH, DEFAULT_INDEX_PATH, DEFAULT_INDEX_TITLE, DEFAULT_OUTPUT_DIR,
};
use feed_mirror::error::ConfigError;
use feed_mirror::fetch::{MAX_RETRIES, USER_AGENT};
use feed_mirror::{logging, FeedOutcome, FetchConfig, Fetcher, Mirror, MirrorConfig, RunReport};

/// Mirror remote RSS feeds to local files and write an HTML index of them.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON list of {"name", "source", "file"} entries
    #[arg(short, long, env = "FEED_MIRROR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory the mirrored feeds are written to
    #[arg(short, long, env = "FEED_MIRROR_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Path of the generated HTML index
    #[arg(short, long, env = "FEED_MIRROR_INDEX", default_value = DEFAULT_INDEX_PATH)]
    index: PathBuf,

    /// Title of the index page
    #[arg(long, default_value = DEFAULT_INDEX_TITLE)]
    title: String,

    /// Per-attempt timeout in seconds
    #[arg(long, default_value = "15")]
    timeout: f64,

    /// Attempts per feed before writing a placeholder
    #[arg(long, default_value_t = MAX_RETRIES)]
    retries: usize,

    /// Base retry delay in seconds, multiplied by the attempt number
    #[arg(long, default_value = "1.5")]
    retry_delay: f64,

    /// User-Agent sent with every request
    #[arg(long, default_value = USER_AGENT)]
    user_agent: String,

    /// Also write daily-rolling logs to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the run report as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Cli {
    fn fetch_config(&self) -> Result<FetchConfig, ConfigError> {
        if self.retries == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "retries",
                reason: "at least one attempt is required".to_string(),
            });
        }

        Ok(FetchConfig {
            timeout: seconds("timeout", self.timeout)?,
            max_attempts: self.retries,
            retry_delay: seconds("retry-delay", self.retry_delay)?,
            user_agent: self.user_agent.clone(),
        })
    }

    fn mirror_config(&self) -> MirrorConfig {
        MirrorConfig {
            config_path: self.config.clone(),
            output_dir: self.output_dir.clone(),
            index_path: self.index.clone(),
            index_title: self.title.clone(),
        }
    }
}

fn seconds(key: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|err| ConfigError::InvalidSetting {
        key,
        reason: err.to_string(),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::configure_logging(cli.log_dir.as_deref());

    let fetcher = Fetcher::new(cli.fetch_config()?).context("Failed to set up feed fetcher")?;
    info!(
        "Fetching with timeout {:?}, {} attempts per feed",
        fetcher.config().timeout,
        fetcher.config().max_attempts
    );

    let mirror = Mirror::new(fetcher, cli.mirror_config());
    info!(
        "Mirroring feeds listed in {} into {}",
        mirror.config().config_path.display(),
        mirror.config().output_dir.display()
    );
    let report = mirror.run().await.context("Mirror run failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    let updated = report.count(FeedOutcome::Updated);
    let unchanged = report.count(FeedOutcome::Unchanged);
    let placeholders =
        report.count(FeedOutcome::PlaceholderWritten) + report.count(FeedOutcome::PlaceholderUnchanged);
    let write_failed = report.count(FeedOutcome::WriteFailed);

    println!(
        "{} feeds: {} updated, {} unchanged, {} placeholders, {} write failures; index {}",
        report.feeds.len(),
        updated.to_string().bright_green(),
        unchanged.to_string().dimmed(),
        placeholders.to_string().bright_yellow(),
        write_failed.to_string().bright_red(),
        if report.index_changed {
            "updated".bright_green()
        } else {
            "unchanged".dimmed()
        }
    );
}
