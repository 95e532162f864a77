//! Mail tool handlers.

use serde_json::{json, Map, Value};

use crate::backend::{CallError, MailBackend};
use crate::config::GatewayConfig;
use crate::models::OutgoingMessage;

use super::{int_arg, str_arg, to_value};

pub(crate) async fn run<B: MailBackend>(
    backend: &B,
    config: &GatewayConfig,
    name: &str,
    args: &Map<String, Value>,
) -> Result<Value, CallError> {
    match name {
        "mail_list_mailboxes" => to_value(&backend.list_mailboxes().await?),

        "mail_list_messages" => {
            let mailbox = str_arg(args, "mailbox").unwrap_or_default();
            // Schema clamps explicit values; this only fills in the default.
            let limit = int_arg(args, "limit").unwrap_or(config.message_page_limit);
            to_value(&backend.list_messages(mailbox, limit.max(1) as usize).await?)
        }

        "mail_get_message" => {
            let mailbox = str_arg(args, "mailbox").unwrap_or_default();
            let id = str_arg(args, "id").unwrap_or_default();
            let message = backend
                .get_message(mailbox, id)
                .await?
                .ok_or_else(|| CallError::NotFound(format!("message `{id}` in `{mailbox}`")))?;
            to_value(&message)
        }

        "mail_send_message" => {
            let message = OutgoingMessage {
                to: str_arg(args, "to").unwrap_or_default().to_string(),
                subject: str_arg(args, "subject").unwrap_or_default().to_string(),
                body: str_arg(args, "body").unwrap_or_default().to_string(),
                cc: str_arg(args, "cc").map(str::to_string),
                bcc: str_arg(args, "bcc").map(str::to_string),
            };
            backend.send_message(&message).await?;
            Ok(json!({ "status": "sent" }))
        }

        other => Err(CallError::Backend(format!(
            "tool `{other}` is not a mail tool"
        ))),
    }
}
