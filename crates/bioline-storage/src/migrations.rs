// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema for accounts, the message log and dead letters.
//!
//! The SQL under `migrations/` is embedded at build time and brought up to
//! date whenever [`Database::open`](crate::Database::open) runs.

use bioline_core::BiolineError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply whatever migrations the connection has not seen yet.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), BiolineError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(BiolineError::storage)?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}
