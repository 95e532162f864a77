//! Declarative input schemas for tool arguments.
//!
//! Validation happens entirely inside the dispatcher, before any backend is
//! touched: missing required fields, wrong types, and unparseable dates are
//! reported with field-level detail. Semantic checks the gateway cannot
//! decide locally (unknown mailbox or list identifiers) are deferred to the
//! backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Str,
    /// Integer, clamped into `[min, max]` rather than rejected.
    Int {
        min: i64,
        max: i64,
    },
    Bool,
    /// RFC 3339 datetime, or a plain `YYYY-MM-DD` date (midnight UTC).
    DateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

pub struct Schema {
    pub fields: &'static [Field],
}

impl Schema {
    pub const EMPTY: Schema = Schema { fields: &[] };

    /// Validate an argument payload against this schema.
    ///
    /// Returns the argument map (with out-of-range integers clamped) on
    /// success, or the full list of problems on failure - all issues are
    /// reported at once, not just the first.
    pub fn validate(&self, args: &Value) -> Result<Map<String, Value>, Vec<String>> {
        let mut map = match args {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            _ => return Err(vec!["arguments must be a JSON object".to_string()]),
        };

        let mut problems = Vec::new();

        for field in self.fields {
            let value = match map.get(field.name) {
                Some(Value::Null) | None => {
                    if field.required {
                        problems.push(format!("missing required field `{}`", field.name));
                    }
                    continue;
                }
                Some(value) => value.clone(),
            };

            match field.kind {
                FieldKind::Str => {
                    if !value.is_string() {
                        problems.push(format!("field `{}` must be a string", field.name));
                    }
                }
                FieldKind::Bool => {
                    if !value.is_boolean() {
                        problems.push(format!("field `{}` must be a boolean", field.name));
                    }
                }
                FieldKind::Int { min, max } => match value.as_i64() {
                    Some(n) => {
                        let clamped = n.clamp(min, max);
                        if clamped != n {
                            map.insert(field.name.to_string(), Value::from(clamped));
                        }
                    }
                    None => {
                        problems.push(format!("field `{}` must be an integer", field.name));
                    }
                },
                FieldKind::DateTime => match value.as_str() {
                    Some(s) if parse_datetime(s).is_some() => {}
                    Some(s) => {
                        problems.push(format!(
                            "field `{}` is not a valid RFC 3339 datetime: `{s}`",
                            field.name
                        ));
                    }
                    None => {
                        problems.push(format!("field `{}` must be a datetime string", field.name));
                    }
                },
            }
        }

        for key in map.keys() {
            if !self.fields.iter().any(|f| f.name == key) {
                problems.push(format!("unknown field `{key}`"));
            }
        }

        if problems.is_empty() {
            Ok(map)
        } else {
            Err(problems)
        }
    }
}

/// Parse an RFC 3339 datetime, falling back to a plain date at midnight UTC.
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}
