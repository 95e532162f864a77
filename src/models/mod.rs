//! Domain payload types for the tool surface.
//!
//! These are the normalized shapes handlers return to the caller, not the
//! backends' native wire formats:
//!
//! - `CalendarInfo`, `EventInfo`, `NewEvent`: calendars and events
//! - `MailboxInfo`, `MessageSummary`, `MessageDetail`, `OutgoingMessage`: mail
//! - `ReminderList`, `Reminder`, `NewReminder`: reminders

pub mod calendar;
pub mod mail;
pub mod reminder;

pub use calendar::{CalendarInfo, EventInfo, NewEvent};
pub use mail::{MailboxInfo, MessageDetail, MessageSummary, OutgoingMessage};
pub use reminder::{NewReminder, Reminder, ReminderList};
