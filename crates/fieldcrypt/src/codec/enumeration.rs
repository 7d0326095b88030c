//! Single enum member codec.
//!
//! The stored form is the member's serde name (`#[serde(rename = ...)]` and
//! `rename_all` apply), so the plaintext matches the wire spelling used
//! everywhere else. Stored names that are not members are rejected.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Codec, CodecError};

const NAME: &str = "EnumCodec";

/// Codec for a column holding one member of a unit-variant enum.
#[derive(Debug)]
pub struct EnumCodec<E> {
    _enum: PhantomData<fn() -> E>,
}

impl<E> EnumCodec<E> {
    /// Create a codec.
    pub const fn new() -> Self {
        Self {
            _enum: PhantomData,
        }
    }
}

impl<E> Clone for EnumCodec<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EnumCodec<E> {}

impl<E> Default for EnumCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Codec for EnumCodec<E>
where
    E: Serialize + DeserializeOwned,
{
    type Value = E;

    fn name(&self) -> &'static str {
        NAME
    }

    fn serialize(&self, value: &E) -> Result<String, CodecError> {
        match serde_json::to_value(value).map_err(|e| CodecError::serialize(NAME, e))? {
            Value::String(member) => Ok(member),
            other => Err(CodecError::serialize(
                NAME,
                format!("expected a unit variant, got {other}"),
            )),
        }
    }

    fn deserialize(&self, raw: &str) -> Result<E, CodecError> {
        serde_json::from_value(Value::String(raw.to_owned()))
            .map_err(|e| CodecError::parse(NAME, raw, e))
    }
}
