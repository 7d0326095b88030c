//! Column bindings: one codec per persisted field, fixed at schema definition.
//!
//! A [`Column`] is what the persistence framework calls when it converts a
//! field to and from its database value. Failures are logged with the column
//! and codec name only; values and ciphertext never reach the logs.

use tracing::warn;

use crate::codec::{Codec, EncryptedField, FieldError};
use crate::crypto::CipherEngine;

/// A named, encrypted column.
#[derive(Debug, Clone)]
pub struct Column<C> {
    name: &'static str,
    field: EncryptedField<C>,
}

impl<C: Codec> Column<C> {
    /// Declare column `name`, stored through `codec` and encrypted by `engine`.
    pub fn new(name: &'static str, codec: C, engine: CipherEngine) -> Self {
        Self {
            name,
            field: EncryptedField::new(codec, engine),
        }
    }

    /// Column name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Convert a domain value into the column's database value.
    ///
    /// # Errors
    ///
    /// Propagates [`FieldError`] from the codec.
    pub fn encode(&self, value: Option<&C::Value>) -> Result<Option<String>, FieldError> {
        self.field.to_storage(value).inspect_err(|e| {
            warn!(
                column = self.name,
                codec = self.field.codec().name(),
                kind = e.kind(),
                "failed to encode encrypted column"
            );
        })
    }

    /// Convert the column's database value back into a domain value.
    ///
    /// # Errors
    ///
    /// Propagates [`FieldError`]; the read of this row must fail.
    pub fn decode(&self, stored: Option<&str>) -> Result<Option<C::Value>, FieldError> {
        self.field.from_storage(stored).inspect_err(|e| {
            warn!(
                column = self.name,
                codec = self.field.codec().name(),
                kind = e.kind(),
                "failed to decode encrypted column"
            );
        })
    }
}
