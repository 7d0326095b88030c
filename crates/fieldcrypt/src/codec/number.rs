//! Integer and floating-point codecs.
//!
//! Values are written in base 10. Parsing is strict: the whole string must be
//! a number, so `"12abc"` and `"3.7"` (for integers) are rejected instead of
//! being truncated to a prefix.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use super::{Codec, CodecError};

/// A numeric type a [`NumberCodec`] can store.
pub trait Numeric: Copy + Display + FromStr {
    /// Codec name reported in errors.
    const CODEC_NAME: &'static str;

    /// Whether the value may be stored. Floats must be finite.
    fn storable(self) -> bool {
        true
    }
}

impl Numeric for i64 {
    const CODEC_NAME: &'static str = "IntCodec";
}

impl Numeric for f64 {
    const CODEC_NAME: &'static str = "FloatCodec";

    fn storable(self) -> bool {
        self.is_finite()
    }
}

/// Codec for numeric columns; the type parameter picks integer or float.
#[derive(Debug)]
pub struct NumberCodec<N> {
    _kind: PhantomData<fn() -> N>,
}

/// Integer column codec.
pub type IntCodec = NumberCodec<i64>;

/// Floating-point column codec.
pub type FloatCodec = NumberCodec<f64>;

impl<N> NumberCodec<N> {
    /// Create a codec.
    pub const fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<N> Clone for NumberCodec<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for NumberCodec<N> {}

impl<N> Default for NumberCodec<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Codec for NumberCodec<N>
where
    N: Numeric,
    N::Err: Display,
{
    type Value = N;

    fn name(&self) -> &'static str {
        N::CODEC_NAME
    }

    fn serialize(&self, value: &N) -> Result<String, CodecError> {
        if !value.storable() {
            return Err(CodecError::serialize(N::CODEC_NAME, "value is not finite"));
        }
        // f64's Display is the shortest string that parses back to the same bits.
        Ok(value.to_string())
    }

    fn deserialize(&self, raw: &str) -> Result<N, CodecError> {
        let value = raw
            .parse::<N>()
            .map_err(|e| CodecError::parse(N::CODEC_NAME, raw, e))?;
        if !value.storable() {
            return Err(CodecError::parse(N::CODEC_NAME, raw, "value is not finite"));
        }
        Ok(value)
    }
}
