//! Log setup for the terminal app.
//!
//! The TUI owns stdout, so logs only go to `dryfire.log` in the state
//! directory. `DRYFIRE_LOG` takes `EnvFilter` directives (default `info`).

use std::path::Path;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::app_dirs::AppDirs;

pub const LOG_ENV: &str = "DRYFIRE_LOG";
pub const LOG_FILE: &str = "dryfire.log";

/// Install the file subscriber.
///
/// The returned guard flushes buffered lines when dropped and must live as
/// long as the app. Returns `None` with logging disabled if no log
/// directory is usable.
pub fn init() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = AppDirs::log_dir()?;
    init_in(&log_dir)
}

pub fn init_in(log_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        // Can't use tracing yet since subscriber not initialized
        eprintln!("Failed to create log directory {:?}: {}, logging disabled", log_dir, e);
        return None;
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::registry()
        .with(file_layer)
        .with(filter)
        .try_init()
        .is_err()
    {
        return None;
    }

    tracing::info!(log_dir = ?log_dir, "dryfire logging initialized");
    Some(guard)
}
