// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the Bioline messaging service.
//!
//! WAL-mode SQLite with embedded refinery migrations and a single-writer
//! connection via `tokio-rusqlite`. Holds the messaging account directory,
//! the append-only message log, and the webhook dead-letter table.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
