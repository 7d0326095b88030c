//! Plain string codec.

use super::{Codec, CodecError};

/// Identity codec for text columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    type Value = String;

    fn name(&self) -> &'static str {
        "StringCodec"
    }

    fn serialize(&self, value: &String) -> Result<String, CodecError> {
        Ok(value.clone())
    }

    fn deserialize(&self, raw: &str) -> Result<String, CodecError> {
        Ok(raw.to_owned())
    }
}
