//! Settings and secret provider.
//!
//! All values are read from environment variables once at start-up. The result
//! is immutable and is handed to whatever builds cipher engines or session
//! stores. A missing or empty `DATABASE_SECRET` fails start-up.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

/// Session timeout used when `SESSION_TIMEOUT_MINUTES` is not set.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 120;

/// Largest timeout whose length in seconds still fits in a `u64`.
pub const MAX_SESSION_TIMEOUT_MINUTES: u64 = u64::MAX / 60;

/// Operator-supplied database encryption secret.
///
/// The value is only reachable through [`DatabaseSecret::expose`]; `Debug`
/// output is redacted.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct DatabaseSecret(String);

impl DatabaseSecret {
    /// Wrap a secret string.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the raw secret. Only key derivation should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DatabaseSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DatabaseSecret([REDACTED])")
    }
}

/// Database settings, combining the connection options with the secret.
#[derive(Debug, Clone)]
pub struct DatabaseConfiguration {
    /// Secret every encrypted column is keyed by.
    pub secret: DatabaseSecret,
    /// Connection URL of the storage engine, if one is configured.
    pub database_url: Option<String>,
    /// How often the storage engine connection is retried at start-up.
    pub max_retries: u32,
}

/// Raw environment shape, before validation.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    #[serde(default)]
    database_secret: DatabaseSecret,

    #[serde(default)]
    database_url: Option<String>,

    #[serde(default = "default_max_retries")]
    database_max_retries: u32,

    #[serde(default)]
    session_timeout_minutes: Option<u64>,

    #[serde(default = "default_session_sweep_interval")]
    session_sweep_interval_secs: u64,

    #[serde(default = "default_log_level")]
    log_level: String,
}

fn default_max_retries() -> u32 {
    2
}
fn default_session_sweep_interval() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".into()
}

/// Validated, read-only process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    database: DatabaseConfiguration,
    session_timeout_minutes: Option<u64>,
    session_sweep_interval_secs: u64,
    log_level: String,
}

impl Settings {
    /// Load and validate settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_SECRET` is absent or empty, or if any
    /// other variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::default())
    }

    /// Load and validate settings from an explicit environment source.
    pub fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let raw: EnvConfig = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        let settings = Self {
            database: DatabaseConfiguration {
                secret: raw.database_secret,
                database_url: raw.database_url.filter(|u| !u.trim().is_empty()),
                max_retries: raw.database_max_retries,
            },
            session_timeout_minutes: raw.session_timeout_minutes,
            session_sweep_interval_secs: raw.session_sweep_interval_secs,
            log_level: raw.log_level,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Build settings around a known secret, with every other value defaulted.
    pub fn with_secret(secret: impl Into<String>) -> Result<Self> {
        let settings = Self {
            database: DatabaseConfiguration {
                secret: DatabaseSecret::new(secret),
                database_url: None,
                max_retries: default_max_retries(),
            },
            session_timeout_minutes: None,
            session_sweep_interval_secs: default_session_sweep_interval(),
            log_level: default_log_level(),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.database.secret.expose().trim().is_empty() {
            anyhow::bail!("DATABASE_SECRET is required and must not be empty");
        }
        if self.database.max_retries == 0 {
            anyhow::bail!("DATABASE_MAX_RETRIES must be > 0");
        }
        match self.session_timeout_minutes {
            Some(0) => anyhow::bail!("SESSION_TIMEOUT_MINUTES must be > 0"),
            Some(m) if m > MAX_SESSION_TIMEOUT_MINUTES => anyhow::bail!(
                "SESSION_TIMEOUT_MINUTES must be <= {MAX_SESSION_TIMEOUT_MINUTES}"
            ),
            _ => {}
        }
        if self.session_sweep_interval_secs == 0 {
            anyhow::bail!("SESSION_SWEEP_INTERVAL_SECS must be > 0");
        }
        Ok(())
    }

    /// The secret used to derive the encryption key.
    pub fn database_secret(&self) -> &DatabaseSecret {
        &self.database.secret
    }

    /// Full database configuration, secret included.
    pub fn database_configuration(&self) -> &DatabaseConfiguration {
        &self.database
    }

    /// How long a session stays valid after its last write or touch.
    ///
    /// Falls back to [`DEFAULT_SESSION_TIMEOUT_MINUTES`] with a warning when
    /// no timeout was configured.
    pub fn session_timeout(&self) -> Duration {
        let minutes = match self.session_timeout_minutes {
            Some(m) => m,
            None => {
                warn!(
                    default_minutes = DEFAULT_SESSION_TIMEOUT_MINUTES,
                    "no session timeout configured; using default"
                );
                DEFAULT_SESSION_TIMEOUT_MINUTES
            }
        };
        Duration::from_secs(minutes * 60)
    }

    /// How often expired sessions are swept.
    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_secs)
    }

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::default().source(Some(map))
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_max_retries(), 2);
        assert_eq!(default_session_sweep_interval(), 60);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn loads_secret_and_defaults() {
        let s = Settings::from_source(env(&[("DATABASE_SECRET", "s3cret")])).unwrap();
        assert_eq!(s.database_secret().expose(), "s3cret");
        assert_eq!(s.database_configuration().max_retries, 2);
        assert!(s.database_configuration().database_url.is_none());
        assert_eq!(s.session_timeout(), Duration::from_secs(120 * 60));
        assert_eq!(s.session_sweep_interval(), Duration::from_secs(60));
        assert_eq!(s.log_level(), "info");
    }

    #[test]
    fn loads_optional_values() {
        let s = Settings::from_source(env(&[
            ("DATABASE_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/tutor"),
            ("DATABASE_MAX_RETRIES", "5"),
            ("SESSION_TIMEOUT_MINUTES", "30"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(
            s.database_configuration().database_url.as_deref(),
            Some("postgres://localhost/tutor")
        );
        assert_eq!(s.database_configuration().max_retries, 5);
        assert_eq!(s.session_timeout(), Duration::from_secs(30 * 60));
        assert_eq!(s.log_level(), "debug");
    }

    #[test]
    fn missing_secret_fails_start_up() {
        let err = Settings::from_source(env(&[("LOG_LEVEL", "info")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_SECRET"));
    }

    #[test]
    fn blank_secret_rejected() {
        assert!(Settings::with_secret("   ").is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let result = Settings::from_source(env(&[
            ("DATABASE_SECRET", "s3cret"),
            ("SESSION_TIMEOUT_MINUTES", "0"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn oversized_timeout_rejected() {
        let result = Settings::from_source(env(&[
            ("DATABASE_SECRET", "s3cret"),
            ("SESSION_TIMEOUT_MINUTES", "18446744073709551615"),
        ]));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("SESSION_TIMEOUT_MINUTES"));
    }

    #[test]
    fn largest_timeout_accepted() {
        let max = MAX_SESSION_TIMEOUT_MINUTES.to_string();
        let s = Settings::from_source(env(&[
            ("DATABASE_SECRET", "s3cret"),
            ("SESSION_TIMEOUT_MINUTES", max.as_str()),
        ]))
        .unwrap();
        assert_eq!(
            s.session_timeout(),
            Duration::from_secs(MAX_SESSION_TIMEOUT_MINUTES * 60)
        );
    }

    #[test]
    fn secret_redacted_in_debug() {
        let s = Settings::with_secret("hunter2").unwrap();
        let dbg = format!("{s:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("hunter2"));
    }
}
