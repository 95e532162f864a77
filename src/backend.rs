//! Backend capability traits.
//!
//! The gateway never speaks CalDAV, IMAP/SMTP, or EventKit itself; each
//! protocol binding lives in a frontend crate and plugs in through one of
//! the traits below. Calendar and Mail authenticate with the stored
//! credential (and possibly a second factor); Reminders only needs a
//! one-time OS permission grant.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::Credential;
use crate::models::{
    CalendarInfo, EventInfo, MailboxInfo, MessageDetail, MessageSummary, NewEvent, NewReminder,
    OutgoingMessage, Reminder, ReminderList,
};

/// The three backends a tool can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Calendar,
    Mail,
    Reminders,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Calendar => "calendar",
            BackendKind::Mail => "mail",
            BackendKind::Reminders => "reminders",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending second-factor challenge from a backend.
///
/// Produced on first authentication when the account requires 2FA; consumed
/// once by supplying a code. How long the resulting trust lasts is backend
/// policy, not something this system tracks.
#[derive(Debug, Clone)]
pub struct TwoFactorChallenge {
    /// Human-readable prompt to show the user.
    pub prompt: String,
    /// Expected code length (e.g. 6 digits).
    pub expected_length: usize,
}

/// Errors from the connect/authenticate path.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("second factor required: {}", .0.prompt)]
    SecondFactor(TwoFactorChallenge),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Errors from data operations on an established session.
#[derive(Debug, Error)]
pub enum CallError {
    /// The backend no longer accepts the cached session. The dispatcher
    /// reacts by re-establishing the session and retrying exactly once.
    #[error("session expired or authentication revoked")]
    AuthExpired,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

/// OS-level permission state for the Reminders backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    Granted,
    Denied,
    NotDetermined,
}

/// Connect path shared by the credential-backed (network) backends.
#[async_trait]
pub trait Authenticate: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Open a connection and authenticate with the given credential.
    ///
    /// `second_factor` carries a 2FA code when the caller is answering a
    /// previously surfaced challenge; `None` on a normal attempt.
    async fn authenticate(
        &self,
        credential: &Credential,
        second_factor: Option<&str>,
    ) -> Result<(), ConnectError>;
}

/// Calendar-sync protocol operations (CalDAV in the shipped binding).
#[async_trait]
pub trait CalendarBackend: Authenticate {
    async fn list_calendars(&self) -> Result<Vec<CalendarInfo>, CallError>;

    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<EventInfo>, CallError>;

    /// Returns `None` when no event with that uid exists.
    async fn get_event(&self, uid: &str) -> Result<Option<EventInfo>, CallError>;

    async fn create_event(&self, event: &NewEvent) -> Result<EventInfo, CallError>;
}

/// Mail protocol pair operations (IMAP for reads, SMTP for send).
#[async_trait]
pub trait MailBackend: Authenticate {
    async fn list_mailboxes(&self) -> Result<Vec<MailboxInfo>, CallError>;

    async fn list_messages(
        &self,
        mailbox: &str,
        limit: usize,
    ) -> Result<Vec<MessageSummary>, CallError>;

    /// Returns `None` when no message with that id exists in the mailbox.
    async fn get_message(&self, mailbox: &str, id: &str)
        -> Result<Option<MessageDetail>, CallError>;

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), CallError>;
}

/// Local device framework operations (EventKit in the shipped binding).
///
/// No network credential is involved; access is gated by a one-time OS
/// permission grant instead.
#[async_trait]
pub trait ReminderBackend: Send + Sync {
    async fn access_status(&self) -> AccessStatus;

    /// Request the OS permission grant, prompting the user if the status is
    /// still undetermined.
    async fn request_access(&self) -> Result<(), ConnectError>;

    async fn list_lists(&self) -> Result<Vec<ReminderList>, CallError>;

    async fn list_reminders(
        &self,
        list_id: Option<&str>,
        include_completed: bool,
    ) -> Result<Vec<Reminder>, CallError>;

    async fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder, CallError>;

    /// Marks the reminder completed; `CallError::NotFound` for unknown ids.
    async fn complete_reminder(&self, id: &str) -> Result<(), CallError>;
}
