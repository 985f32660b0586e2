// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bioline serve` command implementation.
//!
//! Startup runs in a fixed order: tracing, storage (with migrations),
//! components, then the HTTP server. On SIGINT/SIGTERM the server drains
//! in-flight requests and the WAL is checkpointed before exit.

use std::sync::Arc;

use bioline_config::model::BiolineConfig;
use bioline_core::{BiolineError, StorageAdapter};
use bioline_gateway::{start_server, GatewayState};
use bioline_storage::SqliteStorage;
use tracing::{error, info, warn};

use crate::shutdown;

/// Runs the `bioline serve` command.
pub async fn run_serve(config: BiolineConfig) -> Result<(), BiolineError> {
    crate::init_tracing(&config.app.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting bioline serve");

    bioline_whatsapp::recording::register_metrics();
    warn_on_open_settings(&config);

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let state = GatewayState::new(&config, Arc::clone(&storage))?;

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&config.server, state, cancel.clone().cancelled_owned()).await;
    if let Err(e) = &served {
        error!(error = %e, "server exited with error");
    }

    storage.close().await?;
    info!("bioline serve shutdown complete");
    served
}

fn warn_on_open_settings(config: &BiolineConfig) {
    if config.whatsapp.app_secret.is_none() {
        warn!("whatsapp.app_secret is not set; webhook signatures will NOT be verified");
    }
    if config.whatsapp.verify_token.is_none() {
        warn!("whatsapp.verify_token is not set; webhook subscription handshakes will fail");
    }
    if config.auth.tokens.is_empty() {
        warn!("auth.tokens is empty; every authenticated route will answer 401");
    }
}
