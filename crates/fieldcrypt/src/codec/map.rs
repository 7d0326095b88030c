//! Map codec: a JSON array of `[key, value]` pairs.
//!
//! Pairs are written in key order, so equal maps always serialize to the same
//! plaintext. An empty stored string reads back as an empty map.

use std::any::type_name;
use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use super::{Codec, CodecError};

const NAME: &str = "MapCodec";

/// Codec for a column holding a key/value map, e.g. points per exercise.
#[derive(Debug)]
pub struct MapCodec<K, V> {
    _entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V> MapCodec<K, V> {
    /// Create a codec.
    pub const fn new() -> Self {
        Self {
            _entries: PhantomData,
        }
    }
}

impl<K, V> Clone for MapCodec<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for MapCodec<K, V> {}

impl<K, V> Default for MapCodec<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Codec for MapCodec<K, V>
where
    K: Ord + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    type Value = BTreeMap<K, V>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn serialize(&self, value: &BTreeMap<K, V>) -> Result<String, CodecError> {
        let pairs: Vec<(&K, &V)> = value.iter().collect();
        serde_json::to_string(&pairs).map_err(|e| CodecError::serialize(NAME, e))
    }

    fn deserialize(&self, raw: &str) -> Result<BTreeMap<K, V>, CodecError> {
        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }
        let pairs: Vec<(K, V)> = serde_json::from_str(raw).map_err(|e| {
            CodecError::parse(
                NAME,
                raw,
                format!(
                    "expected an array of [key, value] pairs for {}: {e}",
                    type_name::<BTreeMap<K, V>>()
                ),
            )
        })?;
        Ok(pairs.into_iter().collect())
    }
}
