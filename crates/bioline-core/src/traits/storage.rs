// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits: the account directory and the conversation store.

use async_trait::async_trait;

use crate::error::BiolineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AppendOutcome, ConnectRequest, ConversationSummary, DeadLetter, Message, MessagingAccount,
    NewMessage,
};

/// Adapter for storage backends (lifecycle only).
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Opens the backend and applies schema migrations.
    async fn initialize(&self) -> Result<(), BiolineError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), BiolineError>;
}

/// Lookup and linking of messaging accounts.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Finds the account for a platform-assigned phone number id.
    async fn find_by_phone_number_id(
        &self,
        phone_number_id: &str,
    ) -> Result<Option<MessagingAccount>, BiolineError>;

    /// Finds the account only if `owner_user_id` owns it.
    async fn find_owned(
        &self,
        owner_user_id: &str,
        phone_number_id: &str,
    ) -> Result<Option<MessagingAccount>, BiolineError>;

    /// Lists all accounts owned by a user.
    async fn list_owned(
        &self,
        owner_user_id: &str,
    ) -> Result<Vec<MessagingAccount>, BiolineError>;

    /// Creates or refreshes an account and assigns its owner.
    ///
    /// Ownership is first-claim-wins: when the line already belongs to a
    /// different user the call fails with [`BiolineError::AccountClaimed`]
    /// and nothing is modified.
    async fn claim(
        &self,
        owner_user_id: &str,
        request: &ConnectRequest,
    ) -> Result<MessagingAccount, BiolineError>;
}

/// Append-only message log with derived conversation views.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Appends one immutable message and returns the stored row.
    ///
    /// Inbound messages carrying an external id already seen on the same
    /// line yield [`AppendOutcome::Duplicate`] with the original row.
    async fn append_message(&self, message: &NewMessage) -> Result<AppendOutcome, BiolineError>;

    /// Conversation summaries, most recent first, at most `limit`.
    async fn list_conversations(
        &self,
        owner_user_id: &str,
        phone_number_id: &str,
        limit: u32,
    ) -> Result<Vec<ConversationSummary>, BiolineError>;

    /// The `limit` most recent messages of a thread, oldest first.
    async fn list_messages(
        &self,
        owner_user_id: &str,
        phone_number_id: &str,
        contact: &str,
        limit: u32,
    ) -> Result<Vec<Message>, BiolineError>;

    /// Records a delivery that could not be processed.
    async fn record_dead_letter(
        &self,
        phone_number_id: Option<&str>,
        payload: &str,
        error: &str,
    ) -> Result<(), BiolineError>;

    /// Most recent dead letters first.
    async fn list_dead_letters(&self, limit: u32) -> Result<Vec<DeadLetter>, BiolineError>;
}
