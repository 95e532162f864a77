//! Tool registry and handlers.
//!
//! The registry is a static mapping from tool name to the backend it needs
//! and the input schema it accepts: 4 calendar tools, 4 mail tools, and
//! 4 reminders tools, namespaced by service prefix. It is built once and
//! never changes at runtime.
//!
//! Handlers live in the per-capability submodules and translate validated
//! arguments into backend calls, then normalize the backend's domain
//! objects into the tool's declared output shape.

pub mod calendar;
pub mod mail;
pub mod reminders;
pub mod schema;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::{BackendKind, CallError};
use schema::{Field, FieldKind, Schema};

/// One entry in the tool registry.
pub struct ToolDescriptor {
    pub name: &'static str,
    pub capability: BackendKind,
    pub schema: Schema,
}

/// Default page size for `mail_list_messages`.
pub const MESSAGE_LIMIT_DEFAULT: i64 = 20;

/// Hard cap for `mail_list_messages`; larger requests are clamped.
pub const MESSAGE_LIMIT_MAX: i64 = 100;

/// The fixed tool surface. Names and argument shapes are an external
/// interface; changing them breaks callers.
pub static REGISTRY: [ToolDescriptor; 12] = [
    ToolDescriptor {
        name: "calendar_list_calendars",
        capability: BackendKind::Calendar,
        schema: Schema::EMPTY,
    },
    ToolDescriptor {
        name: "calendar_list_events",
        capability: BackendKind::Calendar,
        schema: Schema {
            fields: &[
                Field::optional("start", FieldKind::DateTime),
                Field::optional("end", FieldKind::DateTime),
            ],
        },
    },
    ToolDescriptor {
        name: "calendar_get_event",
        capability: BackendKind::Calendar,
        schema: Schema {
            fields: &[Field::required("uid", FieldKind::Str)],
        },
    },
    ToolDescriptor {
        name: "calendar_create_event",
        capability: BackendKind::Calendar,
        schema: Schema {
            fields: &[
                Field::required("title", FieldKind::Str),
                Field::required("start", FieldKind::DateTime),
                Field::required("end", FieldKind::DateTime),
                Field::optional("calendar_id", FieldKind::Str),
                Field::optional("notes", FieldKind::Str),
            ],
        },
    },
    ToolDescriptor {
        name: "mail_list_mailboxes",
        capability: BackendKind::Mail,
        schema: Schema::EMPTY,
    },
    ToolDescriptor {
        name: "mail_list_messages",
        capability: BackendKind::Mail,
        schema: Schema {
            fields: &[
                Field::required("mailbox", FieldKind::Str),
                Field::optional(
                    "limit",
                    FieldKind::Int {
                        min: 1,
                        max: MESSAGE_LIMIT_MAX,
                    },
                ),
            ],
        },
    },
    ToolDescriptor {
        name: "mail_get_message",
        capability: BackendKind::Mail,
        schema: Schema {
            fields: &[
                Field::required("mailbox", FieldKind::Str),
                Field::required("id", FieldKind::Str),
            ],
        },
    },
    ToolDescriptor {
        name: "mail_send_message",
        capability: BackendKind::Mail,
        schema: Schema {
            fields: &[
                Field::required("to", FieldKind::Str),
                Field::required("subject", FieldKind::Str),
                Field::required("body", FieldKind::Str),
                Field::optional("cc", FieldKind::Str),
                Field::optional("bcc", FieldKind::Str),
            ],
        },
    },
    ToolDescriptor {
        name: "reminders_list_lists",
        capability: BackendKind::Reminders,
        schema: Schema::EMPTY,
    },
    ToolDescriptor {
        name: "reminders_list_reminders",
        capability: BackendKind::Reminders,
        schema: Schema {
            fields: &[
                Field::optional("list_id", FieldKind::Str),
                Field::optional("completed", FieldKind::Bool),
            ],
        },
    },
    ToolDescriptor {
        name: "reminders_create_reminder",
        capability: BackendKind::Reminders,
        schema: Schema {
            fields: &[
                Field::required("title", FieldKind::Str),
                Field::optional("list_id", FieldKind::Str),
                Field::optional("due", FieldKind::DateTime),
            ],
        },
    },
    ToolDescriptor {
        name: "reminders_complete_reminder",
        capability: BackendKind::Reminders,
        schema: Schema {
            fields: &[Field::required("id", FieldKind::Str)],
        },
    },
];

pub fn lookup(name: &str) -> Option<&'static ToolDescriptor> {
    REGISTRY.iter().find(|tool| tool.name == name)
}

// Argument accessors used by handlers after schema validation. Tolerant by
// construction: a missing optional simply yields None.

pub(crate) fn str_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

pub(crate) fn int_arg(args: &Map<String, Value>, name: &str) -> Option<i64> {
    args.get(name).and_then(Value::as_i64)
}

pub(crate) fn bool_arg(args: &Map<String, Value>, name: &str) -> Option<bool> {
    args.get(name).and_then(Value::as_bool)
}

pub(crate) fn datetime_arg(args: &Map<String, Value>, name: &str) -> Option<DateTime<Utc>> {
    str_arg(args, name).and_then(schema::parse_datetime)
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<Value, CallError> {
    serde_json::to_value(value)
        .map_err(|err| CallError::Backend(format!("failed to encode payload: {err}")))
}
