//! Inbound channel message — the normalized product of a webhook.

use serde::{Deserialize, Serialize};

use crate::lead::Provider;

/// A message received from a channel webhook, normalized so the
/// classify → store pipeline does not care which vendor produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Conversation key, prefixed by channel (`wa:`, `ig:`, `tg:`).
    pub conversation_id: String,

    pub provider: Provider,

    /// Provider-specific identifier (phone number ID, page ID, bot chat ID).
    pub provider_id: String,

    /// Who sent the message (phone number, IG user ID, Telegram user ID).
    pub sender: String,

    /// Raw message text. May be empty for non-text payloads.
    pub text: String,
}

impl InboundMessage {
    /// Build the prefixed conversation key for a channel + native chat id.
    pub fn conversation_key(provider: Provider, native_id: &str) -> String {
        let prefix = match provider {
            Provider::Whatsapp => "wa",
            Provider::Instagram => "ig",
            Provider::Telegram => "tg",
            Provider::Facebook => "fb",
        };
        format!("{prefix}:{native_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_key_is_prefixed() {
        assert_eq!(
            InboundMessage::conversation_key(Provider::Whatsapp, "15551234567"),
            "wa:15551234567"
        );
        assert_eq!(
            InboundMessage::conversation_key(Provider::Telegram, "987"),
            "tg:987"
        );
    }
}
