//! [`SessionStore`]: encrypted session persistence over a [`SessionBackend`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use common::{ServiceError, SessionRow};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::backend::{BackendError, SessionBackend};
use crate::codec::{EncryptedField, FieldError, JsonCodec};
use crate::config::Settings;
use crate::crypto::CipherEngine;

/// Opaque key/value session payload.
pub type SessionData = Map<String, Value>;

/// Errors produced by the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The stored payload could not be encrypted, decrypted or parsed.
    #[error("session payload unreadable: {0}")]
    Payload(#[from] FieldError),

    /// The backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<SessionError> for ServiceError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Payload(f) => f.into(),
            SessionError::Backend(b) => ServiceError::Storage(b.to_string()),
        }
    }
}

fn system_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Session store whose payloads are unreadable at rest.
///
/// Each payload goes through [`JsonCodec`] and the cipher before it reaches the
/// backend. Expiry is rolling: [`SessionStore::set`] and
/// [`SessionStore::touch`] push it forward by the configured timeout.
#[derive(Debug)]
pub struct SessionStore<B> {
    backend: B,
    payload: EncryptedField<JsonCodec<SessionData>>,
    ttl: Duration,
    now: fn() -> u64,
}

impl<B: SessionBackend> SessionStore<B> {
    /// Create a store over `backend`, encrypting with `engine`.
    pub fn new(backend: B, engine: CipherEngine, ttl: Duration) -> Self {
        Self {
            backend,
            payload: EncryptedField::new(JsonCodec::new(), engine),
            ttl,
            now: system_now,
        }
    }

    /// Create a store using the secret and session timeout from `settings`.
    pub fn from_settings(backend: B, settings: &Settings) -> Self {
        Self::new(
            backend,
            CipherEngine::from_settings(settings),
            settings.session_timeout(),
        )
    }

    /// Replace the clock (Unix seconds). Used to drive expiry deterministically.
    pub fn with_clock(mut self, now: fn() -> u64) -> Self {
        self.now = now;
        self
    }

    /// A fresh random session id.
    pub fn generate_sid() -> String {
        Uuid::new_v4().to_string()
    }

    /// Session lifetime after a write or touch.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn expires_at(&self) -> u64 {
        (self.now)().saturating_add(self.ttl.as_secs())
    }

    /// Encrypt and store `data` under `sid`, replacing any previous payload.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if serialization or the backend fails.
    pub fn set(&self, sid: &str, data: &SessionData) -> Result<(), SessionError> {
        let session = self.payload.to_storage(Some(data))?.unwrap_or_default();
        self.backend
            .save(SessionRow::new(sid, self.expires_at(), session))?;
        debug!(entries = data.len(), "session stored");
        Ok(())
    }

    /// Load and decrypt the session for `sid`.
    ///
    /// Missing and expired sessions, and rows with an empty payload, yield
    /// `Ok(None)`; expired rows are removed.
    ///
    /// # Errors
    ///
    /// A row that cannot be decrypted or parsed is an error, never an empty
    /// session.
    pub fn get(&self, sid: &str) -> Result<Option<SessionData>, SessionError> {
        let Some(row) = self.backend.load(sid)? else {
            return Ok(None);
        };
        if row.is_expired((self.now)()) {
            debug!("session expired on read");
            self.backend.remove(sid)?;
            return Ok(None);
        }
        let data = self
            .payload
            .from_storage(Some(&row.session))
            .inspect_err(|e| {
                warn!(
                    error_kind = e.kind(),
                    "failed to read encrypted session"
                )
            })?;
        // A row with an empty payload holds no session.
        Ok(data)
    }

    /// Extend a live session's expiry without rewriting its payload.
    ///
    /// Returns `false` if there is no live session for `sid`.
    pub fn touch(&self, sid: &str) -> Result<bool, SessionError> {
        match self.backend.load(sid)? {
            Some(row) if !row.is_expired((self.now)()) => {
                Ok(self.backend.set_expiry(sid, self.expires_at())?)
            }
            _ => Ok(false),
        }
    }

    /// Delete the session for `sid`.
    pub fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.backend.remove(sid)?;
        Ok(())
    }

    /// Delete every expired session; returns how many were removed.
    pub fn clear_expired(&self) -> Result<usize, SessionError> {
        Ok(self.backend.remove_expired((self.now)())?)
    }

    /// Number of stored sessions, expired ones included.
    pub fn count(&self) -> Result<usize, SessionError> {
        Ok(self.backend.count()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseSecret;
    use crate::session::backend::{MemoryBackend, MockSessionBackend};
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    const TTL: Duration = Duration::from_secs(60);

    fn engine(secret: &str) -> CipherEngine {
        CipherEngine::new(&DatabaseSecret::new(secret))
    }

    fn data(v: Value) -> SessionData {
        match v {
            Value::Object(m) => m,
            _ => panic!("test payload must be an object"),
        }
    }

    fn fixed_now() -> u64 {
        1_000
    }

    #[test]
    fn set_then_get() {
        let store = SessionStore::new(MemoryBackend::new(), engine("k"), TTL);
        let payload = data(json!({"passport": {"user": "u-1"}, "cookie": {"httpOnly": true}}));
        store.set("sid-1", &payload).unwrap();
        assert_eq!(store.get("sid-1").unwrap(), Some(payload));
    }

    #[test]
    fn payload_unreadable_at_rest() {
        let backend = MemoryBackend::new();
        let store = SessionStore::new(backend.clone(), engine("k"), TTL);
        store.set("sid-1", &data(json!({"user": "alice"}))).unwrap();
        let row = backend.load("sid-1").unwrap().unwrap();
        assert!(!row.session.contains("alice"));
        assert!(!row.session.contains("user"));
    }

    #[test]
    fn missing_session_is_none() {
        let store = SessionStore::new(MemoryBackend::new(), engine("k"), TTL);
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn expiry_uses_ttl() {
        let backend = MemoryBackend::new();
        let store = SessionStore::new(backend.clone(), engine("k"), TTL).with_clock(fixed_now);
        store.set("sid-1", &SessionData::new()).unwrap();
        assert_eq!(backend.load("sid-1").unwrap().unwrap().expires_at, 1_060);
    }

    static CLOCK: AtomicU64 = AtomicU64::new(0);

    fn test_clock() -> u64 {
        CLOCK.load(Ordering::SeqCst)
    }

    #[test]
    fn expired_session_removed_on_read_and_touch_rolls_expiry() {
        CLOCK.store(100, Ordering::SeqCst);
        let backend = MemoryBackend::new();
        let store = SessionStore::new(backend.clone(), engine("k"), TTL).with_clock(test_clock);
        store.set("a", &data(json!({"n": 1}))).unwrap();
        store.set("b", &data(json!({"n": 2}))).unwrap();

        CLOCK.store(150, Ordering::SeqCst);
        assert!(store.touch("a").unwrap());
        assert_eq!(backend.load("a").unwrap().unwrap().expires_at, 210);

        CLOCK.store(170, Ordering::SeqCst);
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(backend.load("b").unwrap(), None);
        assert!(!store.touch("b").unwrap());
        assert!(store.get("a").unwrap().is_some());

        CLOCK.store(300, Ordering::SeqCst);
        assert_eq!(store.clear_expired().unwrap(), 1);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn destroy_removes_row() {
        let store = SessionStore::new(MemoryBackend::new(), engine("k"), TTL);
        store.set("sid-1", &SessionData::new()).unwrap();
        store.destroy("sid-1").unwrap();
        assert_eq!(store.get("sid-1").unwrap(), None);
    }

    #[test]
    fn session_written_under_other_secret_is_an_error() {
        let backend = MemoryBackend::new();
        let writer = SessionStore::new(backend.clone(), engine("correct-secret"), TTL);
        let reader = SessionStore::new(backend, engine("wrong-secret"), TTL);
        writer.set("sid-1", &data(json!({"foo": "bar", "n": 3}))).unwrap();
        let err = reader.get("sid-1").unwrap_err();
        assert!(matches!(err, SessionError::Payload(_)));
        let service: ServiceError = err.into();
        assert!(!service.is_fatal());
    }

    #[test]
    fn corrupt_row_propagates_decryption_error() {
        let mut backend = MockSessionBackend::new();
        backend
            .expect_load()
            .returning(|sid| Ok(Some(SessionRow::new(sid, u64::MAX, "bm90IGEgYmxvYg=="))));
        backend.expect_remove().never();
        let store = SessionStore::new(backend, engine("k"), TTL);
        let err = store.get("sid-1").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Payload(FieldError::Decryption(_))
        ));
    }

    #[test]
    fn empty_payload_row_is_no_session() {
        let mut backend = MockSessionBackend::new();
        backend
            .expect_load()
            .returning(|sid| Ok(Some(SessionRow::new(sid, u64::MAX, ""))));
        let store = SessionStore::new(backend, engine("k"), TTL);
        assert_eq!(store.get("sid-1").unwrap(), None);
    }

    #[test]
    fn backend_failure_propagates() {
        let mut backend = MockSessionBackend::new();
        backend
            .expect_save()
            .returning(|_| Err(BackendError::Unavailable("connection refused".into())));
        let store = SessionStore::new(backend, engine("k"), TTL);
        let err = store.set("sid-1", &SessionData::new()).unwrap_err();
        let service: ServiceError = err.into();
        assert!(matches!(service, ServiceError::Storage(_)));
    }

    #[test]
    fn missing_row_never_touches_payload() {
        let mut backend = MockSessionBackend::new();
        backend.expect_load().times(1).returning(|_| Ok(None));
        backend.expect_set_expiry().never();
        let store = SessionStore::new(backend, engine("k"), TTL);
        assert!(!store.touch("sid-1").unwrap());
    }

    #[test]
    fn generated_sids_are_unique() {
        let a = SessionStore::<MemoryBackend>::generate_sid();
        let b = SessionStore::<MemoryBackend>::generate_sid();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
