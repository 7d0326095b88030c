//! Command-line definition and command execution.
//!
//! The secret always comes from the environment (`DATABASE_SECRET`); it is
//! never accepted as an argument, so it cannot leak into shell history.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fieldcrypt::codec::{FloatCodec, IntCodec, JsonCodec, MapCodec, StringCodec};
use fieldcrypt::{CipherEngine, Codec, EncryptedField, FieldError, ServiceError};
use serde_json::Value;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fieldcrypt")]
#[command(about = "Encrypt, decrypt and check encrypted column values")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encrypt one value into its stored column text
    Encrypt {
        /// Value shape of the column
        #[arg(short, long, value_enum, default_value_t = CodecKind::String)]
        codec: CodecKind,

        /// Value in the codec's string form (e.g. `42`, `{"a":1}`, `[["k",1]]`)
        value: String,
    },

    /// Decrypt stored column text and print the value's string form
    Decrypt {
        /// Value shape of the column
        #[arg(short, long, value_enum, default_value_t = CodecKind::String)]
        codec: CodecKind,

        /// Base64 text as stored in the column
        stored: String,
    },

    /// Verify that the configured secret can round-trip a value
    Check,
}

/// Column value shapes available from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodecKind {
    String,
    Int,
    Float,
    Json,
    Map,
}

/// Execute `command` with `engine`, returning the text to print.
pub fn execute(command: &Command, engine: &CipherEngine) -> Result<String> {
    match command {
        Command::Encrypt { codec, value } => {
            let stored = match codec {
                CodecKind::String => encrypt_with(StringCodec, engine, value)?,
                CodecKind::Int => encrypt_with(IntCodec::new(), engine, value)?,
                CodecKind::Float => encrypt_with(FloatCodec::new(), engine, value)?,
                CodecKind::Json => encrypt_with(JsonCodec::<Value>::new(), engine, value)?,
                CodecKind::Map => encrypt_with(MapCodec::<String, Value>::new(), engine, value)?,
            };
            Ok(stored.unwrap_or_default())
        }
        Command::Decrypt { codec, stored } => {
            let value = match codec {
                CodecKind::String => decrypt_with(StringCodec, engine, stored)?,
                CodecKind::Int => decrypt_with(IntCodec::new(), engine, stored)?,
                CodecKind::Float => decrypt_with(FloatCodec::new(), engine, stored)?,
                CodecKind::Json => decrypt_with(JsonCodec::<Value>::new(), engine, stored)?,
                CodecKind::Map => decrypt_with(MapCodec::<String, Value>::new(), engine, stored)?,
            };
            Ok(value.unwrap_or_default())
        }
        Command::Check => {
            let probe = "fieldcrypt-self-check";
            let stored = engine.encrypt_text(probe);
            let back = engine
                .decrypt_text(&stored)
                .context("self-check failed to decrypt its own output")?;
            anyhow::ensure!(back == probe, "self-check round trip mismatch");
            info!("secret self-check passed");
            Ok("ok".into())
        }
    }
}

/// Exit status for fatal start-up errors (`EX_CONFIG` from sysexits.h).
pub const EXIT_CONFIG: u8 = 78;

/// Exit status for any other failure.
pub const EXIT_FAILURE: u8 = 1;

/// Place `err` in the service error taxonomy, if it belongs there.
///
/// Invalid command-line input has no service meaning and yields `None`.
pub fn classify(err: &anyhow::Error) -> Option<ServiceError> {
    if let Some(service) = err.downcast_ref::<ServiceError>() {
        return Some(service.clone());
    }
    err.downcast_ref::<FieldError>()
        .map(|field| ServiceError::from(field.clone()))
}

/// Line written to stderr for a failed run, and the process exit status.
pub fn failure_report(err: &anyhow::Error) -> (String, u8) {
    match classify(err) {
        Some(service) => {
            let status = if service.is_fatal() {
                EXIT_CONFIG
            } else {
                EXIT_FAILURE
            };
            let line = format!(
                "ERROR [{}]: {}: {err:#}",
                service.code(),
                service.public_message()
            );
            (line, status)
        }
        None => (format!("ERROR: {err:#}"), EXIT_FAILURE),
    }
}

/// Validate `input` against `codec`, then encrypt it as the column would.
fn encrypt_with<C: Codec>(codec: C, engine: &CipherEngine, input: &str) -> Result<Option<String>> {
    let value = codec
        .deserialize(input)
        .with_context(|| format!("input is not a valid {} value", codec.name()))?;
    let field = EncryptedField::new(codec, engine.clone());
    Ok(field.to_storage(Some(&value))?)
}

/// Decrypt stored column text and render the value in the codec's string form.
fn decrypt_with<C: Codec>(codec: C, engine: &CipherEngine, stored: &str) -> Result<Option<String>> {
    let name = codec.name();
    let field = EncryptedField::new(codec, engine.clone());
    let value = field
        .from_storage(Some(stored))
        .with_context(|| format!("stored value could not be read with {name}"))?;
    match value {
        Some(v) => Ok(Some(field.codec().serialize(&v)?)),
        None => Ok(None),
    }
}
