//! Secret → AES-256 key derivation.

use sha2::{Digest, Sha256};

use super::KEY_LEN;

/// Fixed-size key derived from the database secret.
///
/// Overwritten with zeroes on drop. `Debug` never prints key material.
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive the 32-byte key for `secret` as its SHA-256 digest.
///
/// Deterministic and infallible. An empty secret is accepted here; rejecting it
/// is the job of configuration loading.
pub fn derive_key(secret: &str) -> DerivedKey {
    let digest = Sha256::digest(secret.as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest);
    DerivedKey(key)
}
