//! In-memory test doubles: a secret store and one mock per backend trait.
//!
//! The mocks are deliberately stateful (created events and reminders are
//! readable afterwards) so dispatcher tests can exercise real round-trips,
//! and scriptable (auth modes, expiry injection, delays) so the failure
//! paths are reachable without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::auth::{Credential, SecretStore, SecretStoreError};
use crate::backend::{
    AccessStatus, Authenticate, BackendKind, CalendarBackend, CallError, ConnectError,
    MailBackend, ReminderBackend, TwoFactorChallenge,
};
use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::models::{
    CalendarInfo, EventInfo, MailboxInfo, MessageDetail, MessageSummary, NewEvent, NewReminder,
    OutgoingMessage, Reminder, ReminderList,
};

// ---------------------------------------------------------------------------
// Secret store
// ---------------------------------------------------------------------------

pub(crate) struct MemoryStore {
    credential: std::sync::Mutex<Option<Credential>>,
    unavailable: bool,
}

impl MemoryStore {
    pub(crate) const TEST_IDENTITY: &'static str = "test@example.com";
    pub(crate) const TEST_SECRET: &'static str = "wxyz-test-app-password";

    pub(crate) fn empty() -> Self {
        Self {
            credential: std::sync::Mutex::new(None),
            unavailable: false,
        }
    }

    pub(crate) fn with_test_credential() -> Self {
        Self {
            credential: std::sync::Mutex::new(Some(Credential {
                identity: Self::TEST_IDENTITY.to_string(),
                secret: Self::TEST_SECRET.to_string(),
            })),
            unavailable: false,
        }
    }

    /// A store that refuses every operation, as a locked keychain would.
    pub(crate) fn unavailable() -> Self {
        Self {
            credential: std::sync::Mutex::new(None),
            unavailable: true,
        }
    }

    fn check_available(&self) -> Result<(), SecretStoreError> {
        if self.unavailable {
            Err(SecretStoreError::Unavailable(
                "keychain locked".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        self.credential.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SecretStore for MemoryStore {
    fn get(&self) -> Result<Credential, SecretStoreError> {
        self.check_available()?;
        self.lock().clone().ok_or(SecretStoreError::NotFound)
    }

    fn set(&self, credential: &Credential) -> Result<(), SecretStoreError> {
        self.check_available()?;
        *self.lock() = Some(credential.clone());
        Ok(())
    }

    fn delete(&self) -> Result<(), SecretStoreError> {
        self.check_available()?;
        self.lock().take().map(|_| ()).ok_or(SecretStoreError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Scriptable authentication shared by the network mocks
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub(crate) enum AuthMode {
    Accept,
    Reject(String),
    SecondFactor { accepted_code: String },
}

#[derive(Debug)]
struct AuthScript {
    mode: std::sync::Mutex<AuthMode>,
    delay: std::sync::Mutex<Option<Duration>>,
}

impl AuthScript {
    fn new() -> Self {
        Self {
            mode: std::sync::Mutex::new(AuthMode::Accept),
            delay: std::sync::Mutex::new(None),
        }
    }

    fn set_mode(&self, mode: AuthMode) {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
    }

    fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    async fn authenticate(&self, second_factor: Option<&str>) -> Result<(), ConnectError> {
        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mode = self.mode.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match mode {
            AuthMode::Accept => Ok(()),
            AuthMode::Reject(detail) => Err(ConnectError::AuthRejected(detail)),
            AuthMode::SecondFactor { accepted_code } => match second_factor {
                None => Err(ConnectError::SecondFactor(TwoFactorChallenge {
                    prompt: "Enter the verification code sent to your trusted devices"
                        .to_string(),
                    expected_length: 6,
                })),
                Some(code) if code == accepted_code => Ok(()),
                Some(_) => Err(ConnectError::AuthRejected(
                    "second-factor code rejected".to_string(),
                )),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar mock
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct MockCalendar {
    pub(crate) auth_attempts: AtomicUsize,
    pub(crate) data_calls: AtomicUsize,
    auth: AuthScript,
    expire_remaining: AtomicUsize,
    call_delay: std::sync::Mutex<Option<Duration>>,
    calendars: Vec<CalendarInfo>,
    events: Mutex<Vec<EventInfo>>,
    next_uid: AtomicUsize,
}

impl MockCalendar {
    pub(crate) fn new() -> Self {
        Self {
            auth_attempts: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
            auth: AuthScript::new(),
            expire_remaining: AtomicUsize::new(0),
            call_delay: std::sync::Mutex::new(None),
            calendars: vec![CalendarInfo {
                id: "cal-1".to_string(),
                name: "Personal".to_string(),
            }],
            events: Mutex::new(Vec::new()),
            next_uid: AtomicUsize::new(1),
        }
    }

    pub(crate) fn set_auth_mode(&self, mode: AuthMode) {
        self.auth.set_mode(mode);
    }

    pub(crate) fn set_auth_delay(&self, delay: Duration) {
        self.auth.set_delay(delay);
    }

    pub(crate) fn set_call_delay(&self, delay: Duration) {
        *self.call_delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    /// Make the next `n` data calls fail as if the session had expired.
    pub(crate) fn expire_next_calls(&self, n: usize) {
        self.expire_remaining.store(n, Ordering::SeqCst);
    }

    pub(crate) async fn seed_event(
        &self,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) {
        let uid = format!("evt-{}", self.next_uid.fetch_add(1, Ordering::SeqCst));
        self.events.lock().await.push(EventInfo {
            uid,
            title: title.to_string(),
            start,
            end,
            calendar_id: "cal-1".to_string(),
            notes: None,
        });
    }

    async fn data_call(&self) -> Result<(), CallError> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.call_delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let remaining = self.expire_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.expire_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(CallError::AuthExpired);
        }
        Ok(())
    }
}

#[async_trait]
impl Authenticate for MockCalendar {
    fn kind(&self) -> BackendKind {
        BackendKind::Calendar
    }

    async fn authenticate(
        &self,
        _credential: &Credential,
        second_factor: Option<&str>,
    ) -> Result<(), ConnectError> {
        self.auth_attempts.fetch_add(1, Ordering::SeqCst);
        self.auth.authenticate(second_factor).await
    }
}

#[async_trait]
impl CalendarBackend for MockCalendar {
    async fn list_calendars(&self) -> Result<Vec<CalendarInfo>, CallError> {
        self.data_call().await?;
        Ok(self.calendars.clone())
    }

    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<EventInfo>, CallError> {
        self.data_call().await?;
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .filter(|e| e.start >= start && e.start <= end)
            .cloned()
            .collect())
    }

    async fn get_event(&self, uid: &str) -> Result<Option<EventInfo>, CallError> {
        self.data_call().await?;
        let events = self.events.lock().await;
        Ok(events.iter().find(|e| e.uid == uid).cloned())
    }

    async fn create_event(&self, event: &NewEvent) -> Result<EventInfo, CallError> {
        self.data_call().await?;
        let calendar_id = match &event.calendar_id {
            Some(id) => {
                if !self.calendars.iter().any(|c| &c.id == id) {
                    return Err(CallError::Backend(format!("unknown calendar `{id}`")));
                }
                id.clone()
            }
            None => self.calendars[0].id.clone(),
        };
        let created = EventInfo {
            uid: format!("evt-{}", self.next_uid.fetch_add(1, Ordering::SeqCst)),
            title: event.title.clone(),
            start: event.start,
            end: event.end,
            calendar_id,
            notes: event.notes.clone(),
        };
        self.events.lock().await.push(created.clone());
        Ok(created)
    }
}

// ---------------------------------------------------------------------------
// Mail mock
// ---------------------------------------------------------------------------

pub(crate) struct MockMail {
    pub(crate) auth_attempts: AtomicUsize,
    pub(crate) sent: Mutex<Vec<OutgoingMessage>>,
    auth: AuthScript,
    mailboxes: Mutex<HashMap<String, Vec<MessageDetail>>>,
    next_id: AtomicUsize,
}

impl MockMail {
    pub(crate) fn new() -> Self {
        let mut mailboxes = HashMap::new();
        mailboxes.insert("INBOX".to_string(), Vec::new());
        Self {
            auth_attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            auth: AuthScript::new(),
            mailboxes: Mutex::new(mailboxes),
            next_id: AtomicUsize::new(1),
        }
    }

    pub(crate) fn set_auth_mode(&self, mode: AuthMode) {
        self.auth.set_mode(mode);
    }

    pub(crate) async fn seed_message(&self, mailbox: &str, from: &str, subject: &str, body: &str) {
        let id = format!("msg-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.mailboxes
            .lock()
            .await
            .entry(mailbox.to_string())
            .or_default()
            .push(MessageDetail {
                id,
                from: from.to_string(),
                to: MemoryStore::TEST_IDENTITY.to_string(),
                subject: subject.to_string(),
                date: Utc::now(),
                body: body.to_string(),
            });
    }
}

#[async_trait]
impl Authenticate for MockMail {
    fn kind(&self) -> BackendKind {
        BackendKind::Mail
    }

    async fn authenticate(
        &self,
        _credential: &Credential,
        second_factor: Option<&str>,
    ) -> Result<(), ConnectError> {
        self.auth_attempts.fetch_add(1, Ordering::SeqCst);
        self.auth.authenticate(second_factor).await
    }
}

#[async_trait]
impl MailBackend for MockMail {
    async fn list_mailboxes(&self) -> Result<Vec<MailboxInfo>, CallError> {
        let mailboxes = self.mailboxes.lock().await;
        Ok(mailboxes
            .iter()
            .map(|(name, messages)| MailboxInfo {
                name: name.clone(),
                unread_count: messages.len() as u32,
            })
            .collect())
    }

    async fn list_messages(
        &self,
        mailbox: &str,
        limit: usize,
    ) -> Result<Vec<MessageSummary>, CallError> {
        let mailboxes = self.mailboxes.lock().await;
        let messages = mailboxes
            .get(mailbox)
            .ok_or_else(|| CallError::Backend(format!("unknown mailbox `{mailbox}`")))?;
        Ok(messages
            .iter()
            .take(limit)
            .map(|m| MessageSummary {
                id: m.id.clone(),
                from: m.from.clone(),
                subject: m.subject.clone(),
                date: m.date,
                snippet: m.body.chars().take(80).collect(),
            })
            .collect())
    }

    async fn get_message(
        &self,
        mailbox: &str,
        id: &str,
    ) -> Result<Option<MessageDetail>, CallError> {
        let mailboxes = self.mailboxes.lock().await;
        let messages = mailboxes
            .get(mailbox)
            .ok_or_else(|| CallError::Backend(format!("unknown mailbox `{mailbox}`")))?;
        Ok(messages.iter().find(|m| m.id == id).cloned())
    }

    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), CallError> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reminders mock
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct MockReminders {
    pub(crate) access_requests: AtomicUsize,
    access: Mutex<AccessStatus>,
    refuse_requests: AtomicBool,
    lists: Vec<ReminderList>,
    reminders: Mutex<Vec<(String, Reminder)>>,
    next_id: AtomicUsize,
}

impl MockReminders {
    pub(crate) fn new() -> Self {
        Self {
            access_requests: AtomicUsize::new(0),
            access: Mutex::new(AccessStatus::Granted),
            refuse_requests: AtomicBool::new(false),
            lists: vec![ReminderList {
                id: "list-1".to_string(),
                name: "Reminders".to_string(),
            }],
            reminders: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    pub(crate) async fn set_access(&self, status: AccessStatus) {
        *self.access.lock().await = status;
    }

    pub(crate) fn deny_requests(&self) {
        self.refuse_requests.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReminderBackend for MockReminders {
    async fn access_status(&self) -> AccessStatus {
        *self.access.lock().await
    }

    async fn request_access(&self) -> Result<(), ConnectError> {
        self.access_requests.fetch_add(1, Ordering::SeqCst);
        if self.refuse_requests.load(Ordering::SeqCst) {
            *self.access.lock().await = AccessStatus::Denied;
            return Err(ConnectError::PermissionDenied(
                "reminders access refused by the user".to_string(),
            ));
        }
        *self.access.lock().await = AccessStatus::Granted;
        Ok(())
    }

    async fn list_lists(&self) -> Result<Vec<ReminderList>, CallError> {
        Ok(self.lists.clone())
    }

    async fn list_reminders(
        &self,
        list_id: Option<&str>,
        include_completed: bool,
    ) -> Result<Vec<Reminder>, CallError> {
        let reminders = self.reminders.lock().await;
        Ok(reminders
            .iter()
            .filter(|(list, _)| list_id.map_or(true, |id| list == id))
            .filter(|(_, r)| include_completed || !r.completed)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_reminder(&self, reminder: &NewReminder) -> Result<Reminder, CallError> {
        let list_id = reminder
            .list_id
            .clone()
            .unwrap_or_else(|| self.lists[0].id.clone());
        if !self.lists.iter().any(|l| l.id == list_id) {
            return Err(CallError::Backend(format!("unknown list `{list_id}`")));
        }
        let created = Reminder {
            id: format!("rem-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            title: reminder.title.clone(),
            due: reminder.due,
            completed: false,
        };
        self.reminders
            .lock()
            .await
            .push((list_id, created.clone()));
        Ok(created)
    }

    async fn complete_reminder(&self, id: &str) -> Result<(), CallError> {
        let mut reminders = self.reminders.lock().await;
        for (_, reminder) in reminders.iter_mut() {
            if reminder.id == id {
                reminder.completed = true;
                return Ok(());
            }
        }
        Err(CallError::NotFound(format!("reminder `{id}`")))
    }
}

// ---------------------------------------------------------------------------
// Dispatcher fixture
// ---------------------------------------------------------------------------

pub(crate) struct Fixture {
    pub(crate) dispatcher: Dispatcher<MockCalendar, MockMail, MockReminders>,
    pub(crate) calendar: Arc<MockCalendar>,
    pub(crate) mail: Arc<MockMail>,
    pub(crate) reminders: Arc<MockReminders>,
    pub(crate) store: Arc<MemoryStore>,
}

pub(crate) fn fixture() -> Fixture {
    fixture_with_config(GatewayConfig::default())
}

pub(crate) fn fixture_with_config(config: GatewayConfig) -> Fixture {
    let calendar = Arc::new(MockCalendar::new());
    let mail = Arc::new(MockMail::new());
    let reminders = Arc::new(MockReminders::new());
    let store = Arc::new(MemoryStore::with_test_credential());
    let dispatcher = Dispatcher::new(
        calendar.clone(),
        mail.clone(),
        reminders.clone(),
        store.clone(),
        config,
    );
    Fixture {
        dispatcher,
        calendar,
        mail,
        reminders,
        store,
    }
}
