// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bioline dead-letters`: print webhook deliveries that failed to store.
//!
//! Output is one JSON object per line, newest first, so it can be piped
//! into replay tooling. Payloads may belong to any user; this command is
//! for operators only and has no HTTP counterpart.

use std::io::Write;

use bioline_config::model::BiolineConfig;
use bioline_core::{BiolineError, ConversationStore, StorageAdapter};
use bioline_storage::SqliteStorage;

pub async fn run_dead_letters(config: BiolineConfig, limit: u32) -> Result<(), BiolineError> {
    crate::init_tracing(&config.app.log_level);

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let letters = storage.list_dead_letters(limit).await;
    storage.close().await?;
    let letters = letters?;

    if letters.is_empty() {
        eprintln!("no dead letters");
        return Ok(());
    }

    let mut out = std::io::stdout().lock();
    for letter in &letters {
        let line = serde_json::to_string(letter)
            .map_err(|e| BiolineError::Internal(format!("failed to encode dead letter: {e}")))?;
        writeln!(out, "{line}")
            .map_err(|e| BiolineError::Internal(format!("failed to write output: {e}")))?;
    }
    Ok(())
}
