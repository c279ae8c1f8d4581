use std::io;
use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Log to stdout, filtered by `RUST_LOG` (default `info`). With `log_dir`,
/// also keep a daily-rolling debug log there.
pub fn configure_logging(log_dir: Option<&Path>) {
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_target(false)
        .with_filter(stdout_filter);

    let file_log = log_dir.map(|dir| {
        let file_appender = rolling::daily(dir, "feed-mirror.log");
        fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_filter(EnvFilter::new("debug,hyper=info,reqwest=info,rustls=info"))
    });

    let _ = tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .try_init();
}
