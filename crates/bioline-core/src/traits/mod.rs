// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams between the HTTP surface, the WhatsApp
//! logic, and persistence.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod auth;
pub mod storage;

pub use adapter::PluginAdapter;
pub use auth::AuthAdapter;
pub use storage::{AccountDirectory, ConversationStore, StorageAdapter};
