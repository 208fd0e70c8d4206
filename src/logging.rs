//! Tracing setup: stderr plus a plain-text log file for unattended timer runs.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE: &str = "daywall.log";
const DEFAULT_FILTER: &str = "warn,daywall=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Keep the guard alive until exit so the file is flushed.
///
/// Without a usable `log_dir` only stderr is logged.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    if std::fs::create_dir_all(log_dir).is_err() {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr)
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(filter())
        .with(stderr)
        .with(file)
        .init();
    Some(guard)
}
