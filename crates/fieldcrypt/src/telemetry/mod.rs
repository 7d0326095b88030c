//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No secrets, derived keys, plaintext values or stored ciphertext** may
//!   appear in any log field. Errors are logged by column, codec and error kind.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::{init_telemetry, LogTarget};
