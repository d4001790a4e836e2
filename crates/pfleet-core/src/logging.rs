//! File logging for the `pfleet` binary
//!
//! stdout carries command output (including NDJSON in `--json` mode), so
//! diagnostics only ever go to a daily-rolled file:
//!
//! ```bash
//! PFLEET_LOG=debug pfleet connect
//! PFLEET_LOG=pfleet_bridge=trace pfleet list
//! ```

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Result, ResultExt};

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV_VAR: &str = "PFLEET_LOG";

/// Base name of the rolled log file
pub const LOG_FILE_NAME: &str = "pfleet.log";

/// Our own crates at info, everything else (tokio, mio) at warn
const DEFAULT_FILTER: &str = "pfleet_core=info,pfleet_bridge=info,pfleet_app=info,phone_fleet=info,warn";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Install the global subscriber writing to [`log_file_path`]
pub fn init() -> Result<()> {
    let dir = log_directory();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_NAME);
    let layer = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_timer(fmt::time::ChronoLocal::new(TIMESTAMP_FORMAT.to_string()));

    tracing_subscriber::registry()
        .with(filter_from(std::env::var(LOG_ENV_VAR).ok().as_deref()))
        .with(layer)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dir = %dir.display(),
        "pfleet session started"
    );
    Ok(())
}

/// Parse a filter directive, falling back to [`DEFAULT_FILTER`] when it is
/// absent, blank or malformed
fn filter_from(directive: Option<&str>) -> EnvFilter {
    directive
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// `<data_local_dir>/phone-fleet/logs`, or `./phone-fleet/logs` when the
/// platform has no data directory
fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("phone-fleet")
        .join("logs")
}

/// Path printed to the user when a command fails
pub fn log_file_path() -> PathBuf {
    log_directory().join(LOG_FILE_NAME)
}
