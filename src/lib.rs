//! iCloud Bridge - a credential-backed tool gateway for iCloud data.
//!
//! This library exposes a user's Calendar, Mail, and Reminders data as a
//! fixed set of callable tools. It owns one set of account credentials
//! (stored in the OS keychain, never on disk or in logs), lazily establishes
//! and caches one session per backend, and routes each tool invocation to
//! the right backend with a uniform result/error shape.
//!
//! The concrete protocol bindings (CalDAV, IMAP/SMTP, EventKit) and the
//! outer RPC transport live in frontend crates; they plug in through the
//! `CalendarBackend`, `MailBackend`, and `ReminderBackend` traits.

pub mod auth;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod provision;
pub mod session;
pub mod tools;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{Credential, KeychainStore, SecretStore, SecretStoreError};
pub use backend::{
    AccessStatus, BackendKind, CalendarBackend, CallError, ConnectError, MailBackend,
    ReminderBackend, TwoFactorChallenge,
};
pub use config::GatewayConfig;
pub use dispatch::{Dispatcher, ToolResult};
pub use error::GatewayError;
pub use session::{ReminderSession, SessionError, SessionManager};
pub use verify::{BackendStatus, VerificationReport};

use std::io;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so they never mix with the transport's stdout stream.
/// Use the RUST_LOG env var to control the log level (e.g. RUST_LOG=debug).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}
