//! Per-backend session management.
//!
//! Each backend gets exactly one manager for the process lifetime. A manager
//! owns the lazily-established session state behind a `tokio::sync::Mutex`,
//! so concurrent `ensure_session` calls for the same backend serialize into
//! at most one in-flight authentication - racing to authenticate twice could
//! trigger redundant 2FA challenges or rate limiting.
//!
//! Staleness is discovered reactively: the manager tracks no expiry of its
//! own. When a data call fails with an auth error, the dispatcher calls
//! `invalidate()` and retries once after a fresh `ensure_session()`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::{SecretStore, SecretStoreError};
use crate::backend::{
    AccessStatus, Authenticate, BackendKind, ConnectError, ReminderBackend, TwoFactorChallenge,
};

/// Lifecycle of one backend session.
#[derive(Debug, Clone)]
pub enum SessionState {
    Unestablished,
    Established {
        since: DateTime<Utc>,
        last_used: DateTime<Utc>,
    },
    /// Authentication surfaced a 2FA challenge; waiting on a code.
    SecondFactorPending(TwoFactorChallenge),
    /// The last establishment or retry failed. A later `ensure_session`
    /// attempts again from scratch.
    Failed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no credential stored")]
    NoCredential,

    #[error("secret store unavailable: {0}")]
    SecretStore(String),

    #[error("second factor required: {}", .0.prompt)]
    SecondFactor(TwoFactorChallenge),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Session manager for a credential-backed (network) backend.
///
/// The session handle is the backend itself: after a successful
/// `authenticate` the backend holds whatever transport state it needs, and
/// callers get an `Arc` clone of it.
pub struct SessionManager<B: Authenticate> {
    backend: Arc<B>,
    store: Arc<dyn SecretStore>,
    state: Mutex<SessionState>,
}

impl<B: Authenticate> SessionManager<B> {
    pub fn new(backend: Arc<B>, store: Arc<dyn SecretStore>) -> Self {
        Self {
            backend,
            store,
            state: Mutex::new(SessionState::Unestablished),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Return the cached session handle, establishing one first if needed.
    ///
    /// Idempotent: the state lock is held across the whole establishment, so
    /// N concurrent callers produce exactly one authentication attempt and
    /// all observe the same outcome.
    pub async fn ensure_session(&self) -> Result<Arc<B>, SessionError> {
        let mut state = self.state.lock().await;
        if let SessionState::Established { last_used, .. } = &mut *state {
            *last_used = Utc::now();
            return Ok(self.backend.clone());
        }
        self.establish(&mut state, None).await
    }

    /// Answer a pending second-factor challenge and finish establishing.
    pub async fn submit_second_factor(&self, code: &str) -> Result<Arc<B>, SessionError> {
        let mut state = self.state.lock().await;
        self.establish(&mut state, Some(code)).await
    }

    /// Reactive staleness: drop the cached session so the next
    /// `ensure_session` authenticates afresh.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if let SessionState::Established { since, last_used } = *state {
            debug!(
                backend = %self.kind(),
                established_at = %since,
                last_used = %last_used,
                "invalidating cached session"
            );
        }
        *state = SessionState::Unestablished;
    }

    /// Record a session that failed even after a fresh re-establishment.
    pub async fn mark_failed(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::Failed;
    }

    pub async fn is_established(&self) -> bool {
        matches!(
            *self.state.lock().await,
            SessionState::Established { .. }
        )
    }

    async fn establish(
        &self,
        state: &mut SessionState,
        second_factor: Option<&str>,
    ) -> Result<Arc<B>, SessionError> {
        let credential = self.store.get().map_err(|err| match err {
            SecretStoreError::NotFound => SessionError::NoCredential,
            SecretStoreError::Unavailable(detail) => SessionError::SecretStore(detail),
        })?;

        debug!(
            backend = %self.kind(),
            identity = %credential.identity,
            "establishing session"
        );

        match self.backend.authenticate(&credential, second_factor).await {
            Ok(()) => {
                let now = Utc::now();
                *state = SessionState::Established {
                    since: now,
                    last_used: now,
                };
                Ok(self.backend.clone())
            }
            Err(ConnectError::SecondFactor(challenge)) => {
                *state = SessionState::SecondFactorPending(challenge.clone());
                Err(SessionError::SecondFactor(challenge))
            }
            Err(ConnectError::AuthRejected(detail)) => {
                warn!(backend = %self.kind(), "authentication rejected");
                *state = SessionState::Failed;
                Err(SessionError::AuthRejected(detail))
            }
            Err(ConnectError::PermissionDenied(detail)) => {
                *state = SessionState::Failed;
                Err(SessionError::PermissionDenied(detail))
            }
            Err(ConnectError::Network(detail)) => {
                // Transient: leave the state ready for the next attempt.
                *state = SessionState::Unestablished;
                Err(SessionError::Network(detail))
            }
        }
    }
}

/// Session manager for the Reminders backend.
///
/// Structurally different from the network managers: there is no network
/// credential, only a one-time OS permission grant, so this never touches
/// the secret store.
pub struct ReminderSession<R: ReminderBackend> {
    backend: Arc<R>,
    state: Mutex<SessionState>,
}

impl<R: ReminderBackend> ReminderSession<R> {
    pub fn new(backend: Arc<R>) -> Self {
        Self {
            backend,
            state: Mutex::new(SessionState::Unestablished),
        }
    }

    pub fn kind(&self) -> BackendKind {
        BackendKind::Reminders
    }

    /// Check (and if undetermined, request) the OS permission grant.
    pub async fn ensure_session(&self) -> Result<Arc<R>, SessionError> {
        let mut state = self.state.lock().await;
        if let SessionState::Established { last_used, .. } = &mut *state {
            *last_used = Utc::now();
            return Ok(self.backend.clone());
        }

        let status = self.backend.access_status().await;
        debug!(backend = %self.kind(), ?status, "checking reminders permission");
        if status != AccessStatus::Granted {
            if let Err(err) = self.backend.request_access().await {
                *state = SessionState::Failed;
                return Err(match err {
                    ConnectError::PermissionDenied(detail) => {
                        SessionError::PermissionDenied(detail)
                    }
                    other => SessionError::Network(other.to_string()),
                });
            }
        }

        let now = Utc::now();
        *state = SessionState::Established {
            since: now,
            last_used: now,
        };
        Ok(self.backend.clone())
    }

    /// Permission status only, for verification; never prompts.
    pub async fn permission_status(&self) -> AccessStatus {
        self.backend.access_status().await
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::Unestablished;
    }

    pub async fn mark_failed(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::Failed;
    }
}
