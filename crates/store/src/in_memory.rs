//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use leadsbox_core::error::StoreError;
use leadsbox_core::lead::{Lead, TagUpdate, Transaction};
use leadsbox_core::store::{ConnectionStore, LeadStore};
use leadsbox_core::WhatsappConnection;

/// An in-memory store keeping leads and connections in Vecs.
/// List ordering is insertion order, mirroring the SQLite rowid order.
pub struct InMemoryStore {
    leads: Arc<RwLock<Vec<Lead>>>,
    connections: Arc<RwLock<Vec<WhatsappConnection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            leads: Arc::new(RwLock::new(Vec::new())),
            connections: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeadStore for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn upsert_tag(&self, update: TagUpdate) -> Result<Lead, StoreError> {
        let mut leads = self.leads.write().await;
        let now = Utc::now();

        if let Some(lead) = leads
            .iter_mut()
            .find(|l| l.conversation_id == update.conversation_id)
        {
            lead.provider = update.provider;
            lead.provider_id = update.provider_id;
            lead.transactions.push(Transaction::now(update.tag));
            lead.updated_at = now;
            return Ok(lead.clone());
        }

        let lead = Lead {
            id: Uuid::new_v4().to_string(),
            conversation_id: update.conversation_id,
            provider: update.provider,
            provider_id: update.provider_id,
            transactions: vec![Transaction::now(update.tag)],
            created_at: now,
            updated_at: now,
        };
        leads.push(lead.clone());
        Ok(lead)
    }

    async fn list(&self) -> Result<Vec<Lead>, StoreError> {
        Ok(self.leads.read().await.clone())
    }

    async fn get(&self, conversation_id: &str) -> Result<Option<Lead>, StoreError> {
        let leads = self.leads.read().await;
        Ok(leads
            .iter()
            .find(|l| l.conversation_id == conversation_id)
            .cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.leads.read().await.len())
    }
}

#[async_trait]
impl ConnectionStore for InMemoryStore {
    async fn save(&self, conn: WhatsappConnection) -> Result<WhatsappConnection, StoreError> {
        let mut connections = self.connections.write().await;

        if let Some(existing) = connections.iter_mut().find(|c| {
            c.user_id == conn.user_id
                && c.waba_id == conn.waba_id
                && c.phone_number_id == conn.phone_number_id
        }) {
            existing.access_token = conn.access_token;
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        connections.push(conn.clone());
        Ok(conn)
    }

    async fn find(
        &self,
        user_id: Option<&str>,
        waba_id: &str,
        phone_number_id: &str,
    ) -> Result<Option<WhatsappConnection>, StoreError> {
        let connections = self.connections.read().await;
        Ok(connections
            .iter()
            .find(|c| {
                c.user_id.as_deref() == user_id
                    && c.waba_id == waba_id
                    && c.phone_number_id == phone_number_id
            })
            .cloned())
    }

    async fn list(&self) -> Result<Vec<WhatsappConnection>, StoreError> {
        Ok(self.connections.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadsbox_core::lead::{LeadLabel, Provider};

    fn update(conversation_id: &str, tag: LeadLabel) -> TagUpdate {
        TagUpdate {
            conversation_id: conversation_id.into(),
            tag,
            provider: Provider::Whatsapp,
            provider_id: "109876".into(),
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_appends() {
        let store = InMemoryStore::new();

        let first = store
            .upsert_tag(update("wa:1", LeadLabel::NewInquiry))
            .await
            .unwrap();
        assert_eq!(first.transactions.len(), 1);

        let second = store
            .upsert_tag(update("wa:1", LeadLabel::Engaged))
            .await
            .unwrap();
        assert_eq!(second.transactions.len(), 2);
        assert_eq!(second.current_tag(), Some(LeadLabel::Engaged));

        // One record, not two
        assert_eq!(LeadStore::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = InMemoryStore::new();
        store.upsert_tag(update("wa:a", LeadLabel::NewInquiry)).await.unwrap();
        store.upsert_tag(update("wa:b", LeadLabel::Engaged)).await.unwrap();

        let leads = LeadStore::list(&store).await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].conversation_id, "wa:a");
        assert_eq!(leads[1].conversation_id, "wa:b");
    }

    #[tokio::test]
    async fn connection_upsert_keeps_latest_token() {
        let store = InMemoryStore::new();

        store
            .save(WhatsappConnection::new(
                Some("user-1".into()),
                "waba-1",
                "phone-1",
                "token-old",
            ))
            .await
            .unwrap();
        store
            .save(WhatsappConnection::new(
                Some("user-1".into()),
                "waba-1",
                "phone-1",
                "token-new",
            ))
            .await
            .unwrap();

        let all = ConnectionStore::list(&store).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].access_token, "token-new");
    }

    #[tokio::test]
    async fn connection_without_user_is_its_own_key() {
        let store = InMemoryStore::new();

        store
            .save(WhatsappConnection::new(None, "waba-1", "phone-1", "t1"))
            .await
            .unwrap();
        store
            .save(WhatsappConnection::new(
                Some("user-1".into()),
                "waba-1",
                "phone-1",
                "t2",
            ))
            .await
            .unwrap();

        assert_eq!(ConnectionStore::list(&store).await.unwrap().len(), 2);

        let anon = store.find(None, "waba-1", "phone-1").await.unwrap().unwrap();
        assert_eq!(anon.access_token, "t1");
    }
}
