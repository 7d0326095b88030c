//! AES-256-CBC encryption and decryption of field values.
//!
//! Every call to [`CipherEngine::encrypt`] draws a fresh 16-byte IV from the OS
//! CSPRNG and prepends it to the ciphertext, so encrypting the same value twice
//! yields different blobs.
//!
//! **CBC carries no authentication tag.** A tampered blob either fails padding
//! validation or decrypts to garbage that the codec layer then rejects. Moving to
//! an AEAD mode changes the stored format and needs a migration of existing rows.

use std::sync::Arc;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use super::kdf::{derive_key, DerivedKey};
use super::{BLOCK_LEN, IV_LEN};
use crate::config::{DatabaseSecret, Settings};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Errors produced by the cipher layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The blob is shorter than the IV that must prefix it.
    #[error("ciphertext truncated: {len} bytes is shorter than the {IV_LEN}-byte IV")]
    Truncated {
        /// Length of the rejected blob.
        len: usize,
    },

    /// The ciphertext after the IV is empty or not a whole number of blocks.
    #[error("malformed ciphertext: {len} bytes is not a positive multiple of {BLOCK_LEN}")]
    Malformed {
        /// Length of the ciphertext part (IV excluded).
        len: usize,
    },

    /// Padding was invalid after decryption: wrong key or corrupted data.
    #[error("invalid padding after decryption (wrong key or corrupted data)")]
    BadPadding,

    /// The stored text is not valid base64.
    #[error("stored value is not valid base64")]
    InvalidEncoding,

    /// The decrypted bytes are not valid UTF-8.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Symmetric cipher keyed by the database secret.
///
/// The key is derived once at construction and shared between clones, so an
/// engine can be handed to any number of codecs and threads.
#[derive(Clone, Debug)]
pub struct CipherEngine {
    key: Arc<DerivedKey>,
}

impl CipherEngine {
    /// Build an engine for `secret`.
    pub fn new(secret: &DatabaseSecret) -> Self {
        Self {
            key: Arc::new(derive_key(secret.expose())),
        }
    }

    /// Build an engine for the secret held by `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.database_secret())
    }

    /// Encrypt `plaintext`, returning `IV || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(self.key.as_bytes().into(), (&iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut blob = Vec::with_capacity(IV_LEN + ciphertext.len());
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        blob
    }

    /// Decrypt an `IV || ciphertext` blob produced by [`CipherEngine::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Truncated`] if the blob has no room for the IV,
    /// [`CipherError::Malformed`] if the remainder is not whole blocks, and
    /// [`CipherError::BadPadding`] if the key is wrong or the data is corrupted.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.len() < IV_LEN {
            return Err(CipherError::Truncated { len: blob.len() });
        }
        let (iv, ciphertext) = blob.split_at(IV_LEN);
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CipherError::Malformed {
                len: ciphertext.len(),
            });
        }

        let mut iv_buf = [0u8; IV_LEN];
        iv_buf.copy_from_slice(iv);

        Aes256CbcDec::new(self.key.as_bytes().into(), (&iv_buf).into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::BadPadding)
    }

    /// Encrypt a string into the base64 text stored in a column.
    pub fn encrypt_text(&self, plaintext: &str) -> String {
        STANDARD.encode(self.encrypt(plaintext.as_bytes()))
    }

    /// Decrypt base64 column text back into the original string.
    ///
    /// # Errors
    ///
    /// Everything [`CipherError`] can report, including
    /// [`CipherError::InvalidEncoding`] and [`CipherError::InvalidUtf8`].
    pub fn decrypt_text(&self, stored: &str) -> Result<String, CipherError> {
        let blob = STANDARD
            .decode(stored)
            .map_err(|_| CipherError::InvalidEncoding)?;
        let plaintext = self.decrypt(&blob)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(secret: &str) -> CipherEngine {
        CipherEngine::new(&DatabaseSecret::new(secret))
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let e = engine("correct-secret");
        let blob = e.encrypt(b"123-45-6789");
        assert_eq!(e.decrypt(&blob).unwrap(), b"123-45-6789");
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let e = engine("correct-secret");
        let blob = e.encrypt(b"");
        // IV plus one full padding block.
        assert_eq!(blob.len(), IV_LEN + BLOCK_LEN);
        assert!(e.decrypt(&blob).unwrap().is_empty());
    }

    #[test]
    fn blob_is_iv_plus_whole_blocks() {
        let e = engine("k");
        for len in [0usize, 1, 15, 16, 17, 100] {
            let blob = e.encrypt(&vec![7u8; len]);
            assert_eq!((blob.len() - IV_LEN) % BLOCK_LEN, 0);
            assert!(blob.len() > IV_LEN + len);
        }
    }

    #[test]
    fn fresh_iv_per_call() {
        let e = engine("correct-secret");
        let a = e.encrypt(b"same value");
        let b = e.encrypt(b"same value");
        assert_ne!(a, b);
        assert_ne!(a[..IV_LEN], b[..IV_LEN]);
        assert_eq!(e.decrypt(&a).unwrap(), e.decrypt(&b).unwrap());
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let plaintext = br#"{"foo":"bar","n":3}"#;
        let right = engine("correct-secret");
        let wrong = engine("wrong-secret");
        // A wrong key still yields valid padding about once in 256 tries, so
        // check over several fresh IVs that it never returns the plaintext.
        let mut failures = 0;
        for _ in 0..8 {
            let blob = right.encrypt(plaintext);
            match wrong.decrypt(&blob) {
                Err(CipherError::BadPadding) => failures += 1,
                Err(e) => panic!("unexpected error: {e}"),
                Ok(garbage) => assert_ne!(garbage, plaintext),
            }
        }
        assert!(failures > 0);
    }

    #[test]
    fn truncated_blob_rejected() {
        let e = engine("k");
        assert_eq!(
            e.decrypt(&[0u8; 10]),
            Err(CipherError::Truncated { len: 10 })
        );
    }

    #[test]
    fn iv_only_blob_rejected() {
        let e = engine("k");
        assert_eq!(
            e.decrypt(&[0u8; IV_LEN]),
            Err(CipherError::Malformed { len: 0 })
        );
    }

    #[test]
    fn partial_block_rejected() {
        let e = engine("k");
        let mut blob = e.encrypt(b"hello");
        blob.pop();
        assert!(matches!(e.decrypt(&blob), Err(CipherError::Malformed { .. })));
    }

    #[test]
    fn text_round_trip() {
        let e = engine("k");
        let stored = e.encrypt_text("grüße");
        assert!(STANDARD.decode(&stored).is_ok());
        assert_eq!(e.decrypt_text(&stored).unwrap(), "grüße");
    }

    #[test]
    fn non_base64_text_rejected() {
        assert_eq!(
            engine("k").decrypt_text("not base64!"),
            Err(CipherError::InvalidEncoding)
        );
    }

    #[test]
    fn clones_share_key() {
        let a = engine("k");
        let b = a.clone();
        assert_eq!(b.decrypt(&a.encrypt(b"x")).unwrap(), b"x");
    }

    #[test]
    fn from_settings_uses_configured_secret() {
        let settings = Settings::with_secret("correct-secret").unwrap();
        let blob = CipherEngine::from_settings(&settings).encrypt(b"abc");
        assert_eq!(engine("correct-secret").decrypt(&blob).unwrap(), b"abc");
    }
}
