//! Tool dispatch.
//!
//! One `Dispatcher` per process, constructed at startup with one session
//! manager per backend. Dispatch of a single invocation:
//!
//! 1. Registry lookup (`UnknownTool` if absent).
//! 2. Schema validation (`InvalidArguments` with field-level detail).
//! 3. `ensure_session()` on the required backend, under a per-call timeout.
//! 4. Handler invocation; on an expired-session error the session is
//!    invalidated and the call retried exactly once after a fresh
//!    `ensure_session()`.
//! 5. Result normalization into a `ToolResult` - a failure in one tool call
//!    never terminates the process.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::auth::SecretStore;
use crate::backend::{BackendKind, CalendarBackend, CallError, MailBackend, ReminderBackend};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::session::{ReminderSession, SessionError, SessionManager};
use crate::tools::{self, ToolDescriptor};

/// Structured outcome of one tool invocation. Never carries credential
/// material in either arm.
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
}

impl ToolResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn fail(err: &GatewayError) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(ErrorDetail {
                code: err.code(),
                message: err.to_string(),
                backend: err.backend().map(|b| b.as_str()),
            }),
        }
    }
}

/// The central tool dispatcher.
///
/// Owns one session manager per backend for the process lifetime; the
/// managers are never recreated, only their inner session state cycles.
pub struct Dispatcher<C, M, R>
where
    C: CalendarBackend,
    M: MailBackend,
    R: ReminderBackend,
{
    calendar: SessionManager<C>,
    mail: SessionManager<M>,
    reminders: ReminderSession<R>,
    config: GatewayConfig,
}

impl<C, M, R> Dispatcher<C, M, R>
where
    C: CalendarBackend,
    M: MailBackend,
    R: ReminderBackend,
{
    pub fn new(
        calendar: Arc<C>,
        mail: Arc<M>,
        reminders: Arc<R>,
        store: Arc<dyn SecretStore>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            calendar: SessionManager::new(calendar, store.clone()),
            mail: SessionManager::new(mail, store),
            reminders: ReminderSession::new(reminders),
            config,
        }
    }

    pub fn calendar(&self) -> &SessionManager<C> {
        &self.calendar
    }

    pub fn mail(&self) -> &SessionManager<M> {
        &self.mail
    }

    pub fn reminders(&self) -> &ReminderSession<R> {
        &self.reminders
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Dispatch one tool invocation to its backend.
    pub async fn dispatch(&self, name: &str, args: &Value) -> ToolResult {
        match self.run(name, args).await {
            Ok(payload) => {
                debug!(tool = name, "tool call succeeded");
                ToolResult::ok(payload)
            }
            Err(err) => {
                warn!(tool = name, code = err.code(), "tool call failed: {err}");
                ToolResult::fail(&err)
            }
        }
    }

    async fn run(&self, name: &str, args: &Value) -> Result<Value, GatewayError> {
        let tool = tools::lookup(name)
            .ok_or_else(|| GatewayError::UnknownTool(name.to_string()))?;

        let args = tool
            .schema
            .validate(args)
            .map_err(|problems| GatewayError::InvalidArguments {
                tool: tool.name.to_string(),
                problems,
            })?;

        let timeout = Duration::from_secs(self.config.call_timeout_secs);
        match tokio::time::timeout(timeout, self.invoke(tool, &args)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::BackendTimeout {
                backend: tool.capability,
                timeout_secs: self.config.call_timeout_secs,
            }),
        }
    }

    async fn invoke(
        &self,
        tool: &ToolDescriptor,
        args: &Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        match tool.capability {
            BackendKind::Calendar => self.invoke_calendar(tool.name, args).await,
            BackendKind::Mail => self.invoke_mail(tool.name, args).await,
            BackendKind::Reminders => self.invoke_reminders(tool.name, args).await,
        }
    }

    async fn invoke_calendar(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        let kind = BackendKind::Calendar;
        let handle = self
            .calendar
            .ensure_session()
            .await
            .map_err(|err| session_error(kind, err))?;

        match tools::calendar::run(handle.as_ref(), &self.config, name, args).await {
            Err(CallError::AuthExpired) => {
                debug!(backend = %kind, "session expired, retrying once after re-auth");
                self.calendar.invalidate().await;
                let handle = self
                    .calendar
                    .ensure_session()
                    .await
                    .map_err(|err| session_error(kind, err))?;
                match tools::calendar::run(handle.as_ref(), &self.config, name, args).await {
                    Err(CallError::AuthExpired) => {
                        self.calendar.mark_failed().await;
                        Err(auth_retry_exhausted(kind))
                    }
                    other => other.map_err(|err| call_error(kind, err)),
                }
            }
            other => other.map_err(|err| call_error(kind, err)),
        }
    }

    async fn invoke_mail(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        let kind = BackendKind::Mail;
        let handle = self
            .mail
            .ensure_session()
            .await
            .map_err(|err| session_error(kind, err))?;

        match tools::mail::run(handle.as_ref(), &self.config, name, args).await {
            Err(CallError::AuthExpired) => {
                debug!(backend = %kind, "session expired, retrying once after re-auth");
                self.mail.invalidate().await;
                let handle = self
                    .mail
                    .ensure_session()
                    .await
                    .map_err(|err| session_error(kind, err))?;
                match tools::mail::run(handle.as_ref(), &self.config, name, args).await {
                    Err(CallError::AuthExpired) => {
                        self.mail.mark_failed().await;
                        Err(auth_retry_exhausted(kind))
                    }
                    other => other.map_err(|err| call_error(kind, err)),
                }
            }
            other => other.map_err(|err| call_error(kind, err)),
        }
    }

    async fn invoke_reminders(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        let kind = BackendKind::Reminders;
        let handle = self
            .reminders
            .ensure_session()
            .await
            .map_err(|err| session_error(kind, err))?;

        match tools::reminders::run(handle.as_ref(), name, args).await {
            Err(CallError::AuthExpired) => {
                // Permission revoked mid-flight; one re-check, like the
                // network backends.
                self.reminders.invalidate().await;
                let handle = self
                    .reminders
                    .ensure_session()
                    .await
                    .map_err(|err| session_error(kind, err))?;
                match tools::reminders::run(handle.as_ref(), name, args).await {
                    Err(CallError::AuthExpired) => {
                        self.reminders.mark_failed().await;
                        Err(auth_retry_exhausted(kind))
                    }
                    other => other.map_err(|err| call_error(kind, err)),
                }
            }
            other => other.map_err(|err| call_error(kind, err)),
        }
    }
}

/// Map a session-establishment failure into the dispatch-context taxonomy.
///
/// A second-factor challenge cannot be answered from inside a tool call, so
/// here it degrades to `BackendAuthError` pointing at re-provisioning; the
/// provisioning flow maps the same condition interactively instead.
fn session_error(backend: BackendKind, err: SessionError) -> GatewayError {
    match err {
        SessionError::NoCredential => GatewayError::NoCredential,
        SessionError::SecretStore(detail) => GatewayError::SecretStoreUnavailable(detail),
        SessionError::SecondFactor(_) => GatewayError::BackendAuthError {
            backend,
            detail: "second-factor trust has lapsed; re-run the provisioning flow".to_string(),
        },
        SessionError::AuthRejected(detail) => GatewayError::BackendAuthError { backend, detail },
        SessionError::PermissionDenied(detail) => {
            GatewayError::PermissionDenied { backend, detail }
        }
        SessionError::Network(detail) => GatewayError::BackendError {
            backend,
            message: detail,
        },
    }
}

fn call_error(backend: BackendKind, err: CallError) -> GatewayError {
    match err {
        CallError::AuthExpired => GatewayError::BackendAuthError {
            backend,
            detail: "session expired".to_string(),
        },
        CallError::NotFound(what) => GatewayError::NotFound(what),
        CallError::Backend(message) => GatewayError::BackendError { backend, message },
    }
}

fn auth_retry_exhausted(backend: BackendKind) -> GatewayError {
    GatewayError::BackendAuthError {
        backend,
        detail: "authentication still failing after one retry".to_string(),
    }
}
