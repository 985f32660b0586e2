// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Bioline messaging service.
//!
//! Provides the error taxonomy, domain types, and the collaborator traits
//! (account directory, conversation store, identity) that the WhatsApp
//! and gateway crates are written against.

pub mod error;
pub mod secret;
pub mod traits;
pub mod types;

pub use error::BiolineError;
pub use types::{
    AdapterType, AppendOutcome, ConnectRequest, ConversationSummary, DeadLetter, Direction,
    HealthStatus, Message, MessagingAccount, NewMessage, UserId,
};

pub use traits::{AccountDirectory, AuthAdapter, ConversationStore, PluginAdapter, StorageAdapter};
