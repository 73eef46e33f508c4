//! Telegram Bot API client and webhook update parsing.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use leadsbox_core::error::IntegrationError;
use leadsbox_core::lead::Provider;
use leadsbox_core::InboundMessage;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Thin client for the Telegram Bot API.
pub struct TelegramClient {
    http: Client,
    base_url: String,
    bot_token: String,
}

impl TelegramClient {
    pub fn new(bot_token: String) -> Self {
        Self::with_base_url(bot_token, DEFAULT_API_BASE)
    }

    pub fn with_base_url(bot_token: String, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.bot_token, method)
    }

    /// Register the inbound webhook URL with Telegram.
    pub async fn set_webhook(&self, webhook_url: &str) -> Result<Value, IntegrationError> {
        let url = self.method_url("setWebhook");
        debug!("Telegram setWebhook");

        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "url": webhook_url }))
            .send()
            .await
            .map_err(|e| IntegrationError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IntegrationError::Api {
                status: status.as_u16(),
                body,
            });
        }
        resp.json()
            .await
            .map_err(|e| IntegrationError::InvalidPayload(e.to_string()))
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

// ── Webhook update payload ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Update {
    #[serde(default)]
    message: Option<UpdateMessage>,
}

#[derive(Debug, Deserialize)]
struct UpdateMessage {
    chat: Chat,
    #[serde(default)]
    from: Option<User>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
}

/// Extract an inbound message from a Telegram webhook update.
///
/// Updates without a message (edited posts, callbacks) yield `None`.
/// Messages without text are kept with empty text.
pub fn parse_update(payload: &Value) -> Result<Option<InboundMessage>, IntegrationError> {
    let update: Update = serde_json::from_value(payload.clone())
        .map_err(|e| IntegrationError::InvalidPayload(format!("telegram update: {e}")))?;

    let Some(message) = update.message else {
        return Ok(None);
    };

    let chat_id = message.chat.id.to_string();
    let sender = message
        .from
        .map(|u| u.id.to_string())
        .unwrap_or_else(|| chat_id.clone());

    Ok(Some(InboundMessage {
        conversation_id: InboundMessage::conversation_key(Provider::Telegram, &chat_id),
        provider: Provider::Telegram,
        provider_id: chat_id,
        sender,
        text: message.text.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_embeds_bot_token() {
        let client = TelegramClient::with_base_url("123:ABC".into(), "https://tg.test/");
        assert_eq!(
            client.method_url("setWebhook"),
            "https://tg.test/bot123:ABC/setWebhook"
        );
    }

    #[test]
    fn debug_redacts_bot_token() {
        let client = TelegramClient::new("123:very-secret".into());
        let debug = format!("{client:?}");
        assert!(!debug.contains("very-secret"));
    }

    #[test]
    fn parses_text_update() {
        let payload = serde_json::json!({
            "update_id": 9001,
            "message": {
                "message_id": 14,
                "from": { "id": 42, "is_bot": false, "first_name": "Ada" },
                "chat": { "id": 42, "type": "private" },
                "date": 1714000000,
                "text": "can I get a demo?"
            }
        });

        let msg = parse_update(&payload).unwrap().unwrap();
        assert_eq!(msg.conversation_id, "tg:42");
        assert_eq!(msg.sender, "42");
        assert_eq!(msg.text, "can I get a demo?");
    }

    #[test]
    fn update_without_message_is_none() {
        let payload = serde_json::json!({
            "update_id": 9002,
            "edited_message": { "message_id": 14, "chat": { "id": 42 } }
        });
        assert!(parse_update(&payload).unwrap().is_none());
    }

    #[test]
    fn message_without_text_keeps_empty_text() {
        let payload = serde_json::json!({
            "update_id": 9003,
            "message": {
                "message_id": 15,
                "chat": { "id": 42 },
                "sticker": { "file_id": "abc" }
            }
        });
        let msg = parse_update(&payload).unwrap().unwrap();
        assert!(msg.text.is_empty());
    }
}
