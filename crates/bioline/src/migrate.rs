// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bioline migrate`: bring the database schema up to date and exit.

use bioline_config::model::BiolineConfig;
use bioline_core::BiolineError;
use bioline_storage::Database;
use tracing::info;

pub async fn run_migrate(config: BiolineConfig) -> Result<(), BiolineError> {
    crate::init_tracing(&config.app.log_level);

    let path = &config.storage.database_path;
    let db = Database::open(path, config.storage.wal_mode).await?;
    db.close().await?;

    info!(path = %path, "migrations applied");
    println!("database ready at {path}");
    Ok(())
}
