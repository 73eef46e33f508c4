//! WhatsApp onboarding service and Cloud API webhook parsing.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use leadsbox_core::error::{IntegrationError, StoreError};
use leadsbox_core::lead::Provider;
use leadsbox_core::store::ConnectionStore;
use leadsbox_core::{InboundMessage, WhatsappConnection};

use crate::graph::GraphClient;

/// Onboarding flow for linking a business phone number: Graph API
/// discovery calls plus connection persistence.
#[derive(Clone)]
pub struct WhatsappService {
    graph: GraphClient,
    connections: Arc<dyn ConnectionStore>,
}

impl WhatsappService {
    pub fn new(graph: GraphClient, connections: Arc<dyn ConnectionStore>) -> Self {
        Self { graph, connections }
    }

    /// List businesses owned by a token.
    pub async fn businesses(&self, access_token: &str) -> Result<Value, IntegrationError> {
        self.graph.businesses(access_token).await
    }

    /// List WABAs owned by a business.
    pub async fn business_accounts(
        &self,
        business_id: &str,
        access_token: &str,
    ) -> Result<Value, IntegrationError> {
        self.graph.owned_wabas(business_id, access_token).await
    }

    /// List phone numbers under a WABA.
    pub async fn phone_numbers(
        &self,
        waba_id: &str,
        access_token: &str,
    ) -> Result<Value, IntegrationError> {
        self.graph.phone_numbers(waba_id, access_token).await
    }

    /// Subscribe the app to a WABA's webhooks.
    pub async fn register_webhook(
        &self,
        waba_id: &str,
        access_token: &str,
    ) -> Result<Value, IntegrationError> {
        self.graph.subscribe_webhook(waba_id, access_token).await
    }

    /// Persist a connection (upsert on the user/WABA/phone triple).
    pub async fn save_connection(
        &self,
        user_id: Option<String>,
        waba_id: String,
        phone_number_id: String,
        access_token: String,
    ) -> Result<WhatsappConnection, StoreError> {
        info!(waba_id = %waba_id, phone_number_id = %phone_number_id, "saving WhatsApp connection");
        self.connections
            .save(WhatsappConnection::new(
                user_id,
                waba_id,
                phone_number_id,
                access_token,
            ))
            .await
    }
}

// ── Cloud API webhook payload ───────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    value: ChangeValue,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    phone_number_id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    from: String,
    #[serde(default)]
    text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: String,
}

/// Extract inbound messages from a Cloud API webhook payload.
///
/// Non-message payloads (status updates, etc.) yield an empty list.
/// Non-text messages are kept with empty text so the conversation is
/// still tracked.
pub fn parse_webhook(payload: &Value) -> Result<Vec<InboundMessage>, IntegrationError> {
    let payload: WebhookPayload = serde_json::from_value(payload.clone())
        .map_err(|e| IntegrationError::InvalidPayload(format!("whatsapp webhook: {e}")))?;

    let mut messages = Vec::new();
    for entry in payload.entry {
        for change in entry.changes {
            let phone_number_id = change
                .value
                .metadata
                .as_ref()
                .map(|m| m.phone_number_id.clone())
                .unwrap_or_default();

            for msg in change.value.messages {
                messages.push(InboundMessage {
                    conversation_id: InboundMessage::conversation_key(
                        Provider::Whatsapp,
                        &msg.from,
                    ),
                    provider: Provider::Whatsapp,
                    provider_id: phone_number_id.clone(),
                    sender: msg.from,
                    text: msg.text.map(|t| t.body).unwrap_or_default(),
                });
            }
        }
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadsbox_store::InMemoryStore;

    #[tokio::test]
    async fn save_connection_upserts_latest_token() {
        let store = Arc::new(InMemoryStore::new());
        let service = WhatsappService::new(
            GraphClient::with_base_url("https://graph.test"),
            store.clone(),
        );

        service
            .save_connection(Some("u1".into()), "waba".into(), "phone".into(), "old".into())
            .await
            .unwrap();
        let saved = service
            .save_connection(Some("u1".into()), "waba".into(), "phone".into(), "new".into())
            .await
            .unwrap();

        assert_eq!(saved.access_token, "new");
        assert_eq!(ConnectionStore::list(&*store).await.unwrap().len(), 1);
    }

    #[test]
    fn parses_text_message() {
        let payload = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA_ID",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "metadata": { "display_phone_number": "15550001111", "phone_number_id": "109876" },
                        "messages": [{
                            "from": "15551234567",
                            "id": "wamid.abc",
                            "type": "text",
                            "text": { "body": "how much is the premium plan?" }
                        }]
                    }
                }]
            }]
        });

        let messages = parse_webhook(&payload).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].conversation_id, "wa:15551234567");
        assert_eq!(messages[0].provider_id, "109876");
        assert_eq!(messages[0].text, "how much is the premium plan?");
    }

    #[test]
    fn status_only_payload_yields_nothing() {
        let payload = serde_json::json!({
            "entry": [{
                "changes": [{
                    "field": "messages",
                    "value": {
                        "metadata": { "phone_number_id": "109876" },
                        "statuses": [{ "id": "wamid.abc", "status": "delivered" }]
                    }
                }]
            }]
        });

        let messages = parse_webhook(&payload).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn non_text_message_keeps_empty_text() {
        let payload = serde_json::json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "metadata": { "phone_number_id": "109876" },
                        "messages": [{ "from": "15551234567", "type": "image" }]
                    }
                }]
            }]
        });

        let messages = parse_webhook(&payload).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.is_empty());
    }
}
