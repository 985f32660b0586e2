// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` opens a migrated SQLite database in a temp directory and
//! carries a [`BiolineConfig`] pointing at it, so tests can assemble the
//! ingestor, sender, or full router against real storage.

use std::sync::Arc;

use bioline_config::model::{BiolineConfig, StorageConfig};
use bioline_core::types::{ConnectRequest, Message, MessagingAccount};
use bioline_core::{AccountDirectory, BiolineError, ConversationStore, StorageAdapter};
use bioline_storage::SqliteStorage;

use crate::fixtures::connect_request;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: BiolineConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: BiolineConfig::default(),
        }
    }

    /// Require webhook signatures under this app secret.
    pub fn with_app_secret(mut self, secret: &str) -> Self {
        self.config.whatsapp.app_secret = Some(secret.to_string());
        self
    }

    /// Token expected during the subscription handshake.
    pub fn with_verify_token(mut self, token: &str) -> Self {
        self.config.whatsapp.verify_token = Some(token.to_string());
        self
    }

    /// Point Graph API calls at a mock server.
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        self.config.whatsapp.api_base_url = url.to_string();
        self
    }

    /// Accept `token` as a bearer credential for `user_id`.
    pub fn with_caller(mut self, token: &str, user_id: &str) -> Self {
        self.config
            .auth
            .tokens
            .insert(token.to_string(), user_id.to_string());
        self
    }

    /// Create the temp database and run migrations.
    pub async fn build(mut self) -> Result<TestHarness, BiolineError> {
        let temp_dir = tempfile::TempDir::new().map_err(BiolineError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        self.config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(self.config.storage.clone());
        storage.initialize().await?;

        Ok(TestHarness {
            storage: Arc::new(storage),
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A migrated temp database plus the configuration that points at it.
pub struct TestHarness {
    storage: Arc<SqliteStorage>,
    config: BiolineConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn config(&self) -> &BiolineConfig {
        &self.config
    }

    pub fn storage(&self) -> Arc<SqliteStorage> {
        Arc::clone(&self.storage)
    }

    pub fn accounts(&self) -> Arc<dyn AccountDirectory> {
        self.storage.clone()
    }

    pub fn store(&self) -> Arc<dyn ConversationStore> {
        self.storage.clone()
    }

    /// Link `phone_number_id` to `owner` with fixture credentials.
    pub async fn link_account(
        &self,
        owner: &str,
        phone_number_id: &str,
    ) -> Result<MessagingAccount, BiolineError> {
        self.claim(owner, &connect_request(phone_number_id)).await
    }

    pub async fn claim(
        &self,
        owner: &str,
        request: &ConnectRequest,
    ) -> Result<MessagingAccount, BiolineError> {
        self.storage.claim(owner, request).await
    }

    /// Every stored message of one thread, oldest first.
    pub async fn thread(
        &self,
        owner: &str,
        phone_number_id: &str,
        contact: &str,
    ) -> Result<Vec<Message>, BiolineError> {
        self.storage
            .list_messages(owner, phone_number_id, contact, u32::MAX)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_builds_with_linked_account() {
        let harness = TestHarness::builder()
            .with_caller("tok", "alice")
            .build()
            .await
            .unwrap();
        let account = harness.link_account("alice", "P1").await.unwrap();
        assert_eq!(account.access_token, "token-P1");
        assert_eq!(harness.config().auth.tokens.get("tok").map(String::as_str), Some("alice"));
        assert!(harness.thread("alice", "P1", "C1").await.unwrap().is_empty());
    }
}
