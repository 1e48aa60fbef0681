//! # ecodesc Command-Line Entry Point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Load user settings
//!   ├─> Initialize logging
//!   └─> Execute command, exit 1 if it found problems
//! ```
//!
//! ```bash
//! ecodesc validate ANBO.txt --data
//! ecodesc show ANBO.txt --format markdown
//! ecodesc check ANBO.txt --subset "year==2010" --splits "row:2; column:2"
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Reports go to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    let (settings, settings_error) = match ecodesc::config::load_settings() {
        Ok(settings) => (settings, None),
        Err(e) => (ecodesc::config::Settings::default(), Some(e)),
    };

    ecodesc::logging::init(cli.verbose, cli.log_file || settings.log_to_file)?;
    if let Some(e) = settings_error {
        tracing::warn!("Ignoring unreadable settings file: {e:#}");
    }

    let passed = cli::run_command(cli.command, &settings)?;
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
