// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use bioline_config::model::StorageConfig;
use bioline_core::types::{
    AppendOutcome, ConnectRequest, ConversationSummary, DeadLetter, Message, MessagingAccount,
    NewMessage,
};
use bioline_core::{
    AccountDirectory, AdapterType, BiolineError, ConversationStore, HealthStatus, PluginAdapter,
    StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed account directory and conversation store.
///
/// The database is opened lazily by [`StorageAdapter::initialize`]; every
/// other call fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, BiolineError> {
        self.db.get().ok_or_else(|| BiolineError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BiolineError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BiolineError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), BiolineError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| BiolineError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), BiolineError> {
        self.db()?.checkpoint().await
    }
}

#[async_trait]
impl AccountDirectory for SqliteStorage {
    async fn find_by_phone_number_id(
        &self,
        phone_number_id: &str,
    ) -> Result<Option<MessagingAccount>, BiolineError> {
        queries::accounts::find_by_phone_number_id(self.db()?, phone_number_id).await
    }

    async fn find_owned(
        &self,
        owner_user_id: &str,
        phone_number_id: &str,
    ) -> Result<Option<MessagingAccount>, BiolineError> {
        queries::accounts::find_owned(self.db()?, owner_user_id, phone_number_id).await
    }

    async fn list_owned(&self, owner_user_id: &str) -> Result<Vec<MessagingAccount>, BiolineError> {
        queries::accounts::list_owned(self.db()?, owner_user_id).await
    }

    async fn claim(
        &self,
        owner_user_id: &str,
        request: &ConnectRequest,
    ) -> Result<MessagingAccount, BiolineError> {
        queries::accounts::claim(self.db()?, owner_user_id, request).await
    }
}

#[async_trait]
impl ConversationStore for SqliteStorage {
    async fn append_message(&self, message: &NewMessage) -> Result<AppendOutcome, BiolineError> {
        queries::messages::append_message(self.db()?, message).await
    }

    async fn list_conversations(
        &self,
        owner_user_id: &str,
        phone_number_id: &str,
        limit: u32,
    ) -> Result<Vec<ConversationSummary>, BiolineError> {
        queries::messages::list_conversations(self.db()?, owner_user_id, phone_number_id, limit)
            .await
    }

    async fn list_messages(
        &self,
        owner_user_id: &str,
        phone_number_id: &str,
        contact: &str,
        limit: u32,
    ) -> Result<Vec<Message>, BiolineError> {
        queries::messages::list_messages(self.db()?, owner_user_id, phone_number_id, contact, limit)
            .await
    }

    async fn record_dead_letter(
        &self,
        phone_number_id: Option<&str>,
        payload: &str,
        error: &str,
    ) -> Result<(), BiolineError> {
        queries::dead_letters::record(self.db()?, phone_number_id, payload, error).await
    }

    async fn list_dead_letters(&self, limit: u32) -> Result<Vec<DeadLetter>, BiolineError> {
        queries::dead_letters::list(self.db()?, limit).await
    }
}
