//! Encrypted session persistence.
//!
//! # Lifecycle
//!
//! 1. A request handler writes the session payload with [`SessionStore::set`];
//!    the payload is serialized as JSON, encrypted, and stored as base64 text.
//! 2. Reads go through [`SessionStore::get`], which decrypts and parses the row
//!    or fails; an unreadable session is never replaced by an empty one.
//! 3. Every write or [`SessionStore::touch`] moves the expiry forward by the
//!    session timeout.
//! 4. A background task started with [`expiry_task`] deletes expired rows.
//!
//! # Security invariants
//!
//! - Backends only ever see ciphertext.
//! - Session ids and payloads are never logged.

pub mod backend;
pub mod store;

pub use backend::{BackendError, MemoryBackend, SessionBackend};
pub use store::{SessionData, SessionError, SessionStore};

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, info, warn};

/// Spawn a background task that periodically deletes expired sessions.
///
/// The first sweep fires after one full interval. A failed sweep is logged and
/// retried on the next tick.
pub fn expiry_task<B>(
    store: Arc<SessionStore<B>>,
    interval: Duration,
) -> tokio::task::JoinHandle<()>
where
    B: SessionBackend + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // First tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.clear_expired() {
                Ok(0) => debug!("no expired sessions"),
                Ok(removed) => info!(removed, "expired sessions cleared"),
                Err(e) => warn!(error = %e, "session sweep failed; retrying next interval"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseSecret;
    use crate::crypto::CipherEngine;

    fn stale_clock() -> u64 {
        u64::MAX
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_task_sweeps_on_interval() {
        let backend = MemoryBackend::new();
        let store = Arc::new(
            SessionStore::new(
                backend.clone(),
                CipherEngine::new(&DatabaseSecret::new("k")),
                Duration::from_secs(60),
            )
            .with_clock(stale_clock),
        );
        // Written rows expire at u64::MAX, which the stale clock has reached.
        store.set("a", &SessionData::new()).unwrap();
        store.set("b", &SessionData::new()).unwrap();
        assert_eq!(backend.count().unwrap(), 2);

        let handle = expiry_task(store, Duration::from_secs(10));
        // The paused clock auto-advances while the task waits on its ticker.
        time::sleep(Duration::from_secs(15)).await;
        assert_eq!(backend.count().unwrap(), 0);
        handle.abort();
    }
}
