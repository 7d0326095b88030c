//! Enum array codec: a JSON array of member names.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Codec, CodecError};

const NAME: &str = "EnumArrayCodec";

/// Codec for a column holding a list of enum members, e.g. a user's roles.
#[derive(Debug)]
pub struct EnumArrayCodec<E> {
    _enum: PhantomData<fn() -> E>,
}

impl<E> EnumArrayCodec<E> {
    /// Create a codec.
    pub const fn new() -> Self {
        Self {
            _enum: PhantomData,
        }
    }
}

impl<E> Clone for EnumArrayCodec<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EnumArrayCodec<E> {}

impl<E> Default for EnumArrayCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Codec for EnumArrayCodec<E>
where
    E: Serialize + DeserializeOwned,
{
    type Value = Vec<E>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn serialize(&self, value: &Vec<E>) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::serialize(NAME, e))
    }

    fn deserialize(&self, raw: &str) -> Result<Vec<E>, CodecError> {
        let parsed: Value =
            serde_json::from_str(raw).map_err(|e| CodecError::parse(NAME, raw, e))?;
        if !parsed.is_array() {
            return Err(CodecError::parse(NAME, raw, "value is not an array"));
        }
        serde_json::from_value(parsed).map_err(|e| CodecError::parse(NAME, raw, e))
    }
}
