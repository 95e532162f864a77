//! Credential verification.
//!
//! Exercises each session manager's connect path without touching any data,
//! so a caller can diagnose partial misconfiguration: each backend is
//! checked in isolation and one failure never suppresses another's report.

use serde::Serialize;

use crate::backend::{
    AccessStatus, Authenticate, BackendKind, CalendarBackend, MailBackend, ReminderBackend,
};
use crate::dispatch::Dispatcher;
use crate::session::{ReminderSession, SessionManager};

#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub backend: &'static str,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationReport {
    pub checks: Vec<BackendStatus>,
}

impl VerificationReport {
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(|check| check.ok)
    }
}

impl<C, M, R> Dispatcher<C, M, R>
where
    C: CalendarBackend,
    M: MailBackend,
    R: ReminderBackend,
{
    /// Verify that each backend can be reached with the stored credential
    /// (or permission grant). Never mutates remote state.
    pub async fn verify(&self) -> VerificationReport {
        let (calendar, mail, reminders) = futures::join!(
            check_network(self.calendar()),
            check_network(self.mail()),
            check_reminders(self.reminders()),
        );
        VerificationReport {
            checks: vec![calendar, mail, reminders],
        }
    }
}

async fn check_network<B: Authenticate>(manager: &SessionManager<B>) -> BackendStatus {
    let backend = manager.kind().as_str();
    match manager.ensure_session().await {
        Ok(_) => BackendStatus {
            backend,
            ok: true,
            detail: "session established".to_string(),
        },
        Err(err) => BackendStatus {
            backend,
            ok: false,
            detail: err.to_string(),
        },
    }
}

async fn check_reminders<R: ReminderBackend>(session: &ReminderSession<R>) -> BackendStatus {
    let backend = BackendKind::Reminders.as_str();
    // Status only - verification never triggers the interactive OS prompt.
    let (ok, detail) = match session.permission_status().await {
        AccessStatus::Granted => (true, "permission granted".to_string()),
        AccessStatus::Denied => (false, "permission denied".to_string()),
        AccessStatus::NotDetermined => (
            false,
            "permission not requested yet; it will be prompted on first use".to_string(),
        ),
    };
    BackendStatus {
        backend,
        ok,
        detail,
    }
}
