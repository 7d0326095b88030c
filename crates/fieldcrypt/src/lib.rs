//! Transparent field-level encryption for persisted values.
//!
//! Every encrypted column and session payload is keyed by one database secret,
//! loaded once at start-up into [`config::Settings`]:
//!
//! ```text
//! Settings ──► CipherEngine ──► EncryptedField<Codec> ──► Column / SessionStore
//! ```
//!
//! - [`crypto`] derives the key and runs AES-256-CBC.
//! - [`codec`] turns each value shape into a string and back, and wraps codecs
//!   with the cipher.
//! - [`column`] and [`session`] are the points where the persistence layer
//!   calls in.

pub mod codec;
pub mod column;
pub mod config;
pub mod crypto;
pub mod session;
pub mod telemetry;

pub use common::ServiceError;
pub use codec::{Codec, CodecError, EncryptedField, FieldError};
pub use column::Column;
pub use config::{DatabaseSecret, Settings};
pub use crypto::{CipherEngine, CipherError};
