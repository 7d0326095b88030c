//! JSON document codec.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use super::{Codec, CodecError};

const NAME: &str = "JsonCodec";

/// Codec for a column holding a JSON document.
///
/// Defaults to an untyped [`serde_json::Value`]; any serde type works.
#[derive(Debug)]
pub struct JsonCodec<T = serde_json::Value> {
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Create a codec.
    pub const fn new() -> Self {
        Self { _doc: PhantomData }
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for JsonCodec<T> {}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Value = T;

    fn name(&self) -> &'static str {
        NAME
    }

    fn serialize(&self, value: &T) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::serialize(NAME, e))
    }

    fn deserialize(&self, raw: &str) -> Result<T, CodecError> {
        serde_json::from_str(raw).map_err(|e| CodecError::parse(NAME, raw, e))
    }
}
