//! Store traits — lead and connection persistence.
//!
//! Implementations: SQLite (via sqlx) and in-memory (for testing).
//! Correctness of concurrent upserts relies on the backend's per-key
//! upsert atomicity; there is no locking above the store.

use async_trait::async_trait;

use crate::connection::WhatsappConnection;
use crate::error::StoreError;
use crate::lead::{Lead, TagUpdate};

/// Lead persistence, keyed by conversation identifier.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in-memory").
    fn name(&self) -> &str;

    /// Upsert the lead for `update.conversation_id`: set
    /// provider/provider_id and append one transaction carrying the
    /// tag. Returns the updated or created record.
    async fn upsert_tag(&self, update: TagUpdate) -> Result<Lead, StoreError>;

    /// All leads, in the store's default ordering.
    async fn list(&self) -> Result<Vec<Lead>, StoreError>;

    /// Look up one lead by conversation identifier.
    async fn get(&self, conversation_id: &str) -> Result<Option<Lead>, StoreError>;

    /// Total lead count.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// WhatsApp connection persistence, keyed by (user, WABA, phone-number).
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Upsert on the key triple; the access token is the mutable field.
    /// Returns the stored record.
    async fn save(&self, conn: WhatsappConnection) -> Result<WhatsappConnection, StoreError>;

    /// Look up one connection by its key triple.
    async fn find(
        &self,
        user_id: Option<&str>,
        waba_id: &str,
        phone_number_id: &str,
    ) -> Result<Option<WhatsappConnection>, StoreError>;

    /// All connections.
    async fn list(&self) -> Result<Vec<WhatsappConnection>, StoreError>;
}
