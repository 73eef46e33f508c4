//! Instagram messaging webhook parsing.
//!
//! Instagram DMs arrive on the same Graph webhook infrastructure as
//! WhatsApp but with a `messaging` entry shape.

use serde::Deserialize;
use serde_json::Value;

use leadsbox_core::error::IntegrationError;
use leadsbox_core::lead::Provider;
use leadsbox_core::InboundMessage;

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    /// The IG business account (page) this event belongs to.
    #[serde(default)]
    id: String,
    #[serde(default)]
    messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Deserialize)]
struct MessagingEvent {
    sender: Party,
    #[serde(default)]
    message: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct Party {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    text: Option<String>,
}

/// Extract inbound DMs from an Instagram webhook payload.
///
/// Events without a message body (reads, reactions) are skipped.
pub fn parse_webhook(payload: &Value) -> Result<Vec<InboundMessage>, IntegrationError> {
    let payload: WebhookPayload = serde_json::from_value(payload.clone())
        .map_err(|e| IntegrationError::InvalidPayload(format!("instagram webhook: {e}")))?;

    let mut messages = Vec::new();
    for entry in payload.entry {
        for event in entry.messaging {
            let Some(message) = event.message else {
                continue;
            };
            messages.push(InboundMessage {
                conversation_id: InboundMessage::conversation_key(
                    Provider::Instagram,
                    &event.sender.id,
                ),
                provider: Provider::Instagram,
                provider_id: entry.id.clone(),
                sender: event.sender.id,
                text: message.text.unwrap_or_default(),
            });
        }
    }
    Ok(messages)
}
