//! Row types exchanged with the storage engine.
//!
//! Encrypted columns are plain text as far as storage is concerned; these types
//! only describe where that text lives.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Session rows
// ---------------------------------------------------------------------------

/// One persisted session.
///
/// `session` holds the base64 ciphertext of the JSON session payload and is
/// never readable at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    /// Session identifier (primary key).
    pub sid: String,
    /// Expiry instant as seconds since the Unix epoch.
    pub expires_at: u64,
    /// Encrypted session payload.
    pub session: String,
}

impl SessionRow {
    /// Construct a [`SessionRow`].
    pub fn new(sid: impl Into<String>, expires_at: u64, session: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            expires_at,
            session: session.into(),
        }
    }

    /// Returns `true` once `now` (Unix seconds) has reached the expiry instant.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}
