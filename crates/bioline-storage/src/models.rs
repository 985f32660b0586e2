// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types live in `bioline-core::types` so they can cross
//! trait boundaries; they are re-exported here for the query modules.

pub use bioline_core::types::{
    AppendOutcome, ConnectRequest, ConversationSummary, DeadLetter, Direction, Message,
    MessagingAccount, NewMessage,
};
