//! Calendar tool handlers.

use chrono::{Duration, Utc};
use serde_json::{Map, Value};

use crate::backend::{CalendarBackend, CallError};
use crate::config::GatewayConfig;
use crate::models::NewEvent;

use super::{datetime_arg, str_arg, to_value};

pub(crate) async fn run<B: CalendarBackend>(
    backend: &B,
    config: &GatewayConfig,
    name: &str,
    args: &Map<String, Value>,
) -> Result<Value, CallError> {
    match name {
        "calendar_list_calendars" => to_value(&backend.list_calendars().await?),

        "calendar_list_events" => {
            let start = datetime_arg(args, "start").unwrap_or_else(Utc::now);
            let end = datetime_arg(args, "end")
                .unwrap_or_else(|| start + Duration::days(config.event_window_days));
            to_value(&backend.list_events(start, end).await?)
        }

        "calendar_get_event" => {
            let uid = str_arg(args, "uid").unwrap_or_default();
            let event = backend
                .get_event(uid)
                .await?
                .ok_or_else(|| CallError::NotFound(format!("event `{uid}`")))?;
            to_value(&event)
        }

        "calendar_create_event" => {
            let event = NewEvent {
                title: str_arg(args, "title").unwrap_or_default().to_string(),
                start: datetime_arg(args, "start").unwrap_or_else(Utc::now),
                end: datetime_arg(args, "end").unwrap_or_else(Utc::now),
                calendar_id: str_arg(args, "calendar_id").map(str::to_string),
                notes: str_arg(args, "notes").map(str::to_string),
            };
            to_value(&backend.create_event(&event).await?)
        }

        other => Err(CallError::Backend(format!(
            "tool `{other}` is not a calendar tool"
        ))),
    }
}
