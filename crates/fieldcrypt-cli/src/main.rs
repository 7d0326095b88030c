//! `fieldcrypt` operator CLI entry point.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Settings`] from environment variables.
//! 3. Initialise structured JSON logging on stderr.
//! 4. Build the cipher engine and run the command.
//!
//! Failures are reported on stderr with their service error code. Start-up
//! configuration errors exit with `EX_CONFIG`.

mod cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use fieldcrypt::telemetry::{init_telemetry, LogTarget};
use fieldcrypt::{CipherEngine, ServiceError, Settings};

fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Command line
    // -----------------------------------------------------------------------
    let args = cli::Cli::parse();

    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            // Telemetry may not be up yet; write to stderr directly.
            let (line, status) = cli::failure_report(&e);
            eprintln!("{line}");
            ExitCode::from(status)
        }
    }
}

fn run(args: &cli::Cli) -> Result<String> {
    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let settings =
        Settings::from_env().map_err(|e| ServiceError::Configuration(format!("{e:#}")))?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    init_telemetry(settings.log_level(), LogTarget::Stderr)?;

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    let engine = CipherEngine::from_settings(&settings);
    cli::execute(&args.command, &engine)
}
