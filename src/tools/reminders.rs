//! Reminders tool handlers.

use serde_json::{json, Map, Value};

use crate::backend::{CallError, ReminderBackend};
use crate::models::NewReminder;

use super::{bool_arg, datetime_arg, str_arg, to_value};

pub(crate) async fn run<B: ReminderBackend>(
    backend: &B,
    name: &str,
    args: &Map<String, Value>,
) -> Result<Value, CallError> {
    match name {
        "reminders_list_lists" => to_value(&backend.list_lists().await?),

        "reminders_list_reminders" => {
            let list_id = str_arg(args, "list_id");
            // `completed=true` selects completed reminders; the default view
            // is the open ones.
            let completed = bool_arg(args, "completed").unwrap_or(false);
            let reminders = backend.list_reminders(list_id, completed).await?;
            let filtered: Vec<_> = reminders
                .into_iter()
                .filter(|r| r.completed == completed)
                .collect();
            to_value(&filtered)
        }

        "reminders_create_reminder" => {
            let reminder = NewReminder {
                title: str_arg(args, "title").unwrap_or_default().to_string(),
                list_id: str_arg(args, "list_id").map(str::to_string),
                due: datetime_arg(args, "due"),
            };
            to_value(&backend.create_reminder(&reminder).await?)
        }

        "reminders_complete_reminder" => {
            let id = str_arg(args, "id").unwrap_or_default();
            backend.complete_reminder(id).await?;
            Ok(json!({ "status": "completed" }))
        }

        other => Err(CallError::Backend(format!(
            "tool `{other}` is not a reminders tool"
        ))),
    }
}
