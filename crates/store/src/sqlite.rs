//! SQLite store backend.
//!
//! One database file, two tables:
//! - `leads` — one row per conversation, transactions as a JSON column
//! - `whatsapp_connections` — one row per (user, WABA, phone-number)
//!
//! Upserts go through `INSERT .. ON CONFLICT DO UPDATE` on the key
//! column; the lead transaction append happens inside a transaction so
//! concurrent tag updates on the same conversation cannot lose writes.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use leadsbox_core::error::StoreError;
use leadsbox_core::lead::{Lead, Provider, TagUpdate, Transaction};
use leadsbox_core::store::{ConnectionStore, LeadStore};
use leadsbox_core::WhatsappConnection;

/// The production SQLite store. Implements both [`LeadStore`] and
/// [`ConnectionStore`] over one connection pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the store at a file path.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database (useful
    /// for tests). The schema is created automatically.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leads (
                iid             INTEGER PRIMARY KEY AUTOINCREMENT,
                id              TEXT UNIQUE NOT NULL,
                conversation_id TEXT UNIQUE NOT NULL,
                provider        TEXT NOT NULL,
                provider_id     TEXT NOT NULL,
                transactions    TEXT NOT NULL DEFAULT '[]',
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("leads table: {e}")))?;

        // user_id uses '' (not NULL) for connections made without a
        // logged-in user: SQLite UNIQUE treats NULLs as distinct, which
        // would break the at-most-one-row-per-triple invariant.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS whatsapp_connections (
                iid             INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         TEXT NOT NULL DEFAULT '',
                waba_id         TEXT NOT NULL,
                phone_number_id TEXT NOT NULL,
                access_token    TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                UNIQUE(user_id, waba_id, phone_number_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("whatsapp_connections table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let conversation_id: String = row
            .try_get("conversation_id")
            .map_err(|e| StoreError::QueryFailed(format!("conversation_id column: {e}")))?;
        let provider_str: String = row
            .try_get("provider")
            .map_err(|e| StoreError::QueryFailed(format!("provider column: {e}")))?;
        let provider_id: String = row
            .try_get("provider_id")
            .map_err(|e| StoreError::QueryFailed(format!("provider_id column: {e}")))?;
        let transactions_json: String = row
            .try_get("transactions")
            .map_err(|e| StoreError::QueryFailed(format!("transactions column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::QueryFailed(format!("updated_at column: {e}")))?;

        let provider = Provider::from_str(&provider_str)
            .map_err(|e| StoreError::QueryFailed(format!("provider column: {e}")))?;
        let transactions: Vec<Transaction> =
            serde_json::from_str(&transactions_json).unwrap_or_default();

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Lead {
            id,
            conversation_id,
            provider,
            provider_id,
            transactions,
            created_at,
            updated_at,
        })
    }

    fn row_to_connection(row: &sqlx::sqlite::SqliteRow) -> Result<WhatsappConnection, StoreError> {
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| StoreError::QueryFailed(format!("user_id column: {e}")))?;
        let waba_id: String = row
            .try_get("waba_id")
            .map_err(|e| StoreError::QueryFailed(format!("waba_id column: {e}")))?;
        let phone_number_id: String = row
            .try_get("phone_number_id")
            .map_err(|e| StoreError::QueryFailed(format!("phone_number_id column: {e}")))?;
        let access_token: String = row
            .try_get("access_token")
            .map_err(|e| StoreError::QueryFailed(format!("access_token column: {e}")))?;
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::QueryFailed(format!("updated_at column: {e}")))?;

        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(WhatsappConnection {
            user_id: if user_id.is_empty() { None } else { Some(user_id) },
            waba_id,
            phone_number_id,
            access_token,
            updated_at,
        })
    }
}

#[async_trait]
impl LeadStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn upsert_tag(&self, update: TagUpdate) -> Result<Lead, StoreError> {
        let now = Utc::now();
        let transaction = Transaction::now(update.tag);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        let existing =
            sqlx::query("SELECT transactions, id, created_at FROM leads WHERE conversation_id = ?1")
                .bind(&update.conversation_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| StoreError::QueryFailed(format!("lead lookup: {e}")))?;

        let (id, created_at, mut transactions) = match existing {
            Some(row) => {
                let id: String = row
                    .try_get("id")
                    .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
                let created_at: String = row
                    .try_get("created_at")
                    .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;
                let json: String = row
                    .try_get("transactions")
                    .map_err(|e| StoreError::QueryFailed(format!("transactions column: {e}")))?;
                let transactions: Vec<Transaction> = serde_json::from_str(&json).unwrap_or_default();
                (id, created_at, transactions)
            }
            None => (Uuid::new_v4().to_string(), now.to_rfc3339(), Vec::new()),
        };

        transactions.push(transaction);
        let transactions_json = serde_json::to_string(&transactions)
            .map_err(|e| StoreError::Storage(format!("transactions serialization: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO leads (id, conversation_id, provider, provider_id, transactions, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(conversation_id) DO UPDATE SET
                provider = excluded.provider,
                provider_id = excluded.provider_id,
                transactions = excluded.transactions,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&update.conversation_id)
        .bind(update.provider.as_str())
        .bind(&update.provider_id)
        .bind(&transactions_json)
        .bind(&created_at)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("lead upsert: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(conversation_id = %update.conversation_id, tag = %update.tag, "lead tag upserted");

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);

        Ok(Lead {
            id,
            conversation_id: update.conversation_id,
            provider: update.provider,
            provider_id: update.provider_id,
            transactions,
            created_at,
            updated_at: now,
        })
    }

    async fn list(&self) -> Result<Vec<Lead>, StoreError> {
        let rows = sqlx::query("SELECT * FROM leads ORDER BY iid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("lead list: {e}")))?;

        rows.iter().map(Self::row_to_lead).collect()
    }

    async fn get(&self, conversation_id: &str) -> Result<Option<Lead>, StoreError> {
        let row = sqlx::query("SELECT * FROM leads WHERE conversation_id = ?1")
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("lead get: {e}")))?;

        row.as_ref().map(Self::row_to_lead).transpose()
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM leads")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("lead count: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}

#[async_trait]
impl ConnectionStore for SqliteStore {
    async fn save(&self, conn: WhatsappConnection) -> Result<WhatsappConnection, StoreError> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO whatsapp_connections (user_id, waba_id, phone_number_id, access_token, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, waba_id, phone_number_id) DO UPDATE SET
                access_token = excluded.access_token,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(conn.user_id.as_deref().unwrap_or(""))
        .bind(&conn.waba_id)
        .bind(&conn.phone_number_id)
        .bind(&conn.access_token)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("connection upsert: {e}")))?;

        debug!(waba_id = %conn.waba_id, phone_number_id = %conn.phone_number_id, "connection saved");

        Ok(WhatsappConnection {
            updated_at: now,
            ..conn
        })
    }

    async fn find(
        &self,
        user_id: Option<&str>,
        waba_id: &str,
        phone_number_id: &str,
    ) -> Result<Option<WhatsappConnection>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM whatsapp_connections
            WHERE user_id = ?1 AND waba_id = ?2 AND phone_number_id = ?3
            "#,
        )
        .bind(user_id.unwrap_or(""))
        .bind(waba_id)
        .bind(phone_number_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("connection find: {e}")))?;

        row.as_ref().map(Self::row_to_connection).transpose()
    }

    async fn list(&self) -> Result<Vec<WhatsappConnection>, StoreError> {
        let rows = sqlx::query("SELECT * FROM whatsapp_connections ORDER BY iid")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("connection list: {e}")))?;

        rows.iter().map(Self::row_to_connection).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadsbox_core::lead::LeadLabel;

    async fn test_store() -> SqliteStore {
        SqliteStore::open(":memory:").await.unwrap()
    }

    fn update(conversation_id: &str, tag: LeadLabel) -> TagUpdate {
        TagUpdate {
            conversation_id: conversation_id.into(),
            tag,
            provider: Provider::Whatsapp,
            provider_id: "109876".into(),
        }
    }

    #[tokio::test]
    async fn upsert_twice_yields_one_lead_two_transactions() {
        let store = test_store().await;

        store.upsert_tag(update("wa:1", LeadLabel::NewInquiry)).await.unwrap();
        let lead = store.upsert_tag(update("wa:1", LeadLabel::Engaged)).await.unwrap();

        assert_eq!(lead.transactions.len(), 2);
        assert_eq!(lead.transactions[0].tag, LeadLabel::NewInquiry);
        assert_eq!(lead.transactions[1].tag, LeadLabel::Engaged);
        assert_eq!(LeadStore::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_preserves_id_and_created_at() {
        let store = test_store().await;

        let first = store.upsert_tag(update("wa:1", LeadLabel::NewInquiry)).await.unwrap();
        let second = store.upsert_tag(update("wa:1", LeadLabel::Engaged)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(
            first.created_at.timestamp_millis(),
            second.created_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn list_returns_rows_in_insertion_order() {
        let store = test_store().await;
        store.upsert_tag(update("wa:a", LeadLabel::NewInquiry)).await.unwrap();
        store.upsert_tag(update("wa:b", LeadLabel::DemoRequest)).await.unwrap();

        let leads = LeadStore::list(&store).await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].conversation_id, "wa:a");
        assert_eq!(leads[1].conversation_id, "wa:b");
        assert_eq!(leads[1].current_tag(), Some(LeadLabel::DemoRequest));
    }

    #[tokio::test]
    async fn get_unknown_conversation_is_none() {
        let store = test_store().await;
        assert!(store.get("wa:nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn connection_upsert_keeps_latest_token() {
        let store = test_store().await;

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
        assert_eq!(all[0].user_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn anonymous_connections_share_one_row() {
        let store = test_store().await;

        store
            .save(WhatsappConnection::new(None, "waba-1", "phone-1", "t1"))
            .await
            .unwrap();
        store
            .save(WhatsappConnection::new(None, "waba-1", "phone-1", "t2"))
            .await
            .unwrap();

        let all = ConnectionStore::list(&store).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].access_token, "t2");
        assert!(all[0].user_id.is_none());
    }

    #[tokio::test]
    async fn find_distinguishes_user_scope() {
        let store = test_store().await;

        store
            .save(WhatsappConnection::new(None, "waba-1", "phone-1", "anon"))
            .await
            .unwrap();
        store
            .save(WhatsappConnection::new(
                Some("user-1".into()),
                "waba-1",
                "phone-1",
                "owned",
            ))
            .await
            .unwrap();

        let anon = store.find(None, "waba-1", "phone-1").await.unwrap().unwrap();
        assert_eq!(anon.access_token, "anon");

        let owned = store
            .find(Some("user-1"), "waba-1", "phone-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owned.access_token, "owned");
    }
}
