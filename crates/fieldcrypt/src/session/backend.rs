//! Storage seam for session rows, plus an in-process implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::SessionRow;
use thiserror::Error;

/// Errors reported by a session backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The storage engine could not complete the operation.
    #[error("session backend unavailable: {0}")]
    Unavailable(String),

    /// A writer panicked while holding the in-process lock.
    #[error("session backend lock poisoned")]
    Poisoned,
}

/// The storage engine as seen by the session store.
///
/// Implementations only ever see encrypted payloads.
#[cfg_attr(test, mockall::automock)]
pub trait SessionBackend: Send + Sync {
    /// Fetch the row for `sid`, expired or not.
    fn load(&self, sid: &str) -> Result<Option<SessionRow>, BackendError>;

    /// Insert or replace a row.
    fn save(&self, row: SessionRow) -> Result<(), BackendError>;

    /// Move the expiry of an existing row. Returns `false` if there is no row.
    fn set_expiry(&self, sid: &str, expires_at: u64) -> Result<bool, BackendError>;

    /// Delete the row for `sid`, if any.
    fn remove(&self, sid: &str) -> Result<(), BackendError>;

    /// Delete every row expired at `now`; returns how many were deleted.
    fn remove_expired(&self, now: u64) -> Result<usize, BackendError>;

    /// Number of stored rows, expired ones included.
    fn count(&self) -> Result<usize, BackendError>;
}

/// Thread-safe in-memory backend.
///
/// Clones share the same map, so one instance can be handed to the store and
/// another kept for inspection.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<HashMap<String, SessionRow>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self, sid: &str) -> Result<Option<SessionRow>, BackendError> {
        let rows = self.inner.read().map_err(|_| BackendError::Poisoned)?;
        Ok(rows.get(sid).cloned())
    }

    fn save(&self, row: SessionRow) -> Result<(), BackendError> {
        let mut rows = self.inner.write().map_err(|_| BackendError::Poisoned)?;
        rows.insert(row.sid.clone(), row);
        Ok(())
    }

    fn set_expiry(&self, sid: &str, expires_at: u64) -> Result<bool, BackendError> {
        let mut rows = self.inner.write().map_err(|_| BackendError::Poisoned)?;
        match rows.get_mut(sid) {
            Some(row) => {
                row.expires_at = expires_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, sid: &str) -> Result<(), BackendError> {
        let mut rows = self.inner.write().map_err(|_| BackendError::Poisoned)?;
        rows.remove(sid);
        Ok(())
    }

    fn remove_expired(&self, now: u64) -> Result<usize, BackendError> {
        let mut rows = self.inner.write().map_err(|_| BackendError::Poisoned)?;
        let before = rows.len();
        rows.retain(|_, row| !row.is_expired(now));
        Ok(before - rows.len())
    }

    fn count(&self) -> Result<usize, BackendError> {
        let rows = self.inner.read().map_err(|_| BackendError::Poisoned)?;
        Ok(rows.len())
    }
}
