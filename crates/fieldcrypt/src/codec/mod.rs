//! Value codecs and the encrypted-field wrapper.
//!
//! A [`Codec`] turns one value shape into its canonical string form and back.
//! Codecs know nothing about encryption. [`EncryptedField`] binds any codec to
//! a [`CipherEngine`] and is the only place that runs the cipher, so absent
//! values are short-circuited in exactly one spot.
//!
//! Write path: `serialize` → UTF-8 → encrypt → base64 → column.
//! Read path: column → base64 → decrypt → UTF-8 → `deserialize`.

pub mod enum_array;
pub mod enumeration;
pub mod json;
pub mod map;
pub mod number;
pub mod string;

pub use enum_array::EnumArrayCodec;
pub use enumeration::EnumCodec;
pub use json::JsonCodec;
pub use map::MapCodec;
pub use number::{FloatCodec, IntCodec, NumberCodec};
pub use string::StringCodec;

use common::ServiceError;
use thiserror::Error;

use crate::crypto::{CipherEngine, CipherError};

/// Errors produced while converting between a value and its string form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The stored string does not parse into the codec's value shape.
    #[error("{codec} cannot parse stored value {raw:?}: {reason}")]
    Parse {
        /// Name of the codec that rejected the value.
        codec: &'static str,
        /// The decrypted string that failed to parse.
        raw: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The value could not be turned into a string.
    #[error("{codec} cannot serialize value: {reason}")]
    Serialize {
        /// Name of the codec that failed.
        codec: &'static str,
        /// What went wrong.
        reason: String,
    },
}

impl CodecError {
    /// Build a [`CodecError::Parse`].
    pub fn parse(codec: &'static str, raw: &str, reason: impl ToString) -> Self {
        CodecError::Parse {
            codec,
            raw: raw.to_owned(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`CodecError::Serialize`].
    pub fn serialize(codec: &'static str, reason: impl ToString) -> Self {
        CodecError::Serialize {
            codec,
            reason: reason.to_string(),
        }
    }

    /// Name of the codec that produced the error.
    pub fn codec(&self) -> &'static str {
        match self {
            CodecError::Parse { codec, .. } | CodecError::Serialize { codec, .. } => codec,
        }
    }
}

/// Conversion between one value shape and its canonical string form.
///
/// Implementations are stateless strategies; they are built once per field
/// type and shared freely.
pub trait Codec {
    /// The in-memory value this codec handles.
    type Value;

    /// Short codec name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Canonical string form of `value`.
    fn serialize(&self, value: &Self::Value) -> Result<String, CodecError>;

    /// Parse a string produced by [`Codec::serialize`].
    fn deserialize(&self, raw: &str) -> Result<Self::Value, CodecError>;
}

/// Failure while reading or writing an encrypted field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    /// The stored blob could not be decrypted.
    #[error("decryption failed: {0}")]
    Decryption(#[from] CipherError),

    /// The value could not be converted to or from its string form.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl FieldError {
    /// Short failure class, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldError::Decryption(_) => "decryption",
            FieldError::Codec(_) => "codec",
        }
    }
}

impl From<FieldError> for ServiceError {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::Decryption(c) => ServiceError::Decryption(c.to_string()),
            FieldError::Codec(c @ CodecError::Parse { .. }) => {
                ServiceError::Deserialization(c.to_string())
            }
            FieldError::Codec(c @ CodecError::Serialize { .. }) => {
                ServiceError::Serialization(c.to_string())
            }
        }
    }
}

/// A codec bound to a cipher engine: the full storage conversion for one field.
#[derive(Debug, Clone)]
pub struct EncryptedField<C> {
    codec: C,
    engine: CipherEngine,
}

impl<C: Codec> EncryptedField<C> {
    /// Bind `codec` to `engine`.
    pub fn new(codec: C, engine: CipherEngine) -> Self {
        Self { codec, engine }
    }

    /// The wrapped codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Convert a domain value to the text written to storage.
    ///
    /// `None`, and values whose string form is empty, are stored as `None`
    /// without running the cipher.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Codec`] if the value cannot be serialized.
    pub fn to_storage(&self, value: Option<&C::Value>) -> Result<Option<String>, FieldError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let plain = self.codec.serialize(value)?;
        if plain.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.engine.encrypt_text(&plain)))
    }

    /// Convert stored text back into a domain value.
    ///
    /// `None` and the empty string yield `Ok(None)` without running the cipher.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Decryption`] if the blob cannot be decrypted and
    /// [`FieldError::Codec`] if the plaintext does not parse.
    pub fn from_storage(&self, stored: Option<&str>) -> Result<Option<C::Value>, FieldError> {
        let stored = match stored {
            None | Some("") => return Ok(None),
            Some(s) => s,
        };
        let plain = self.engine.decrypt_text(stored)?;
        Ok(Some(self.codec.deserialize(&plain)?))
    }
}
