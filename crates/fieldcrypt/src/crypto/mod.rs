//! AES-256-CBC field encryption primitives.
//!
//! This module is free of storage and serialisation concerns. It provides key
//! derivation and the byte-level encrypt/decrypt used by the codec layer.
//!
//! # Stored format
//!
//! ```text
//! base64( IV (16 bytes) || AES-256-CBC-PKCS7(SHA-256(secret), IV, plaintext) )
//! ```

pub mod cipher;
pub mod kdf;

pub use cipher::{CipherEngine, CipherError};
pub use kdf::{derive_key, DerivedKey};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the CBC initialisation vector.
pub const IV_LEN: usize = 16;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;
