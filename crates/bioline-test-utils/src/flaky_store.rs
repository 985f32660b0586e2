// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store wrapper with switchable write failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use bioline_core::types::{AppendOutcome, ConversationSummary, DeadLetter, Message, NewMessage};
use bioline_core::{BiolineError, ConversationStore};
use bioline_storage::SqliteStorage;

/// Delegates to real storage, except that appends fail while
/// [`fail_appends`](FlakyStore::fail_appends) is on. Dead letters always
/// reach the inner store.
pub struct FlakyStore {
    inner: Arc<SqliteStorage>,
    fail_appends: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteStorage>) -> Self {
        Self {
            inner,
            fail_appends: AtomicBool::new(false),
        }
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConversationStore for FlakyStore {
    async fn append_message(&self, message: &NewMessage) -> Result<AppendOutcome, BiolineError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(BiolineError::storage(std::io::Error::other("injected write failure")));
        }
        self.inner.append_message(message).await
    }

    async fn list_conversations(
        &self,
        owner_user_id: &str,
        phone_number_id: &str,
        limit: u32,
    ) -> Result<Vec<ConversationSummary>, BiolineError> {
        self.inner
            .list_conversations(owner_user_id, phone_number_id, limit)
            .await
    }

    async fn list_messages(
        &self,
        owner_user_id: &str,
        phone_number_id: &str,
        contact: &str,
        limit: u32,
    ) -> Result<Vec<Message>, BiolineError> {
        self.inner
            .list_messages(owner_user_id, phone_number_id, contact, limit)
            .await
    }

    async fn record_dead_letter(
        &self,
        phone_number_id: Option<&str>,
        payload: &str,
        error: &str,
    ) -> Result<(), BiolineError> {
        self.inner
            .record_dead_letter(phone_number_id, payload, error)
            .await
    }

    async fn list_dead_letters(&self, limit: u32) -> Result<Vec<DeadLetter>, BiolineError> {
        self.inner.list_dead_letters(limit).await
    }
}
