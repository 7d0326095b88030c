//! Tracing subscriber initialisation.

use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Where structured logs are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard output, for long-running services.
    #[default]
    Stdout,
    /// Standard error, for tools whose stdout carries command output.
    Stderr,
}

impl LogTarget {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Initialise the global tracing subscriber.
///
/// Emits JSON-formatted structured logs to `target`, filtered by `RUST_LOG`
/// when set and by `log_level` otherwise.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_telemetry(log_level: &str, target: LogTarget) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(target.make_writer()),
        )
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    Ok(())
}
