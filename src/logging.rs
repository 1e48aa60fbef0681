//! Logging setup for the `ecodesc` binary.
//!
//! Diagnostics go to stderr so report output on stdout stays machine-readable.
//! Optionally, logs are also written to daily rolling files in the app data
//! directory.
//!
//! ## Usage
//!
//! ```no_run
//! use ecodesc::logging;
//!
//! // Initialize once at startup: verbosity 1 = info, no log files
//! logging::init(1, false).expect("Failed to initialize logging");
//!
//! tracing::info!("Descriptor loaded");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const LOG_FILE_PREFIX: &str = "ecodesc";

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/ecodesc/logs`
/// - macOS: `~/Library/Application Support/ecodesc/logs`
/// - Linux: `~/.local/share/ecodesc/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let log_dir = crate::utils::data_dir().join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Default filter directive for a `-v` count.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initializes logging to stderr and, if asked, to rolling files.
///
/// `RUST_LOG` overrides the level derived from `verbosity`.
///
/// # Errors
///
/// Returns error if the log directory or file appender cannot be created, or
/// if a global subscriber is already installed.
pub fn init(verbosity: u8, log_to_file: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_for_verbosity(verbosity)))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = if log_to_file {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .max_log_files(10)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .build(get_log_dir()?)
            .context("Failed to create log file appender")?;

        Some(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(appender),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if log_to_file {
        tracing::debug!("Writing logs to {}", get_current_log_path()?.display());
    }

    Ok(())
}

/// Gets the path to the current log file
pub fn get_current_log_path() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Ok(log_dir.join(format!("{LOG_FILE_PREFIX}.{today}.log")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), "warn");
        assert_eq!(level_for_verbosity(2), "debug");
        assert_eq!(level_for_verbosity(9), "trace");
    }
}
