use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderList {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// A create-reminder request; the backend assigns the id.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub title: String,
    /// Target list; the backend uses its default list when omitted.
    pub list_id: Option<String>,
    pub due: Option<DateTime<Utc>>,
}
