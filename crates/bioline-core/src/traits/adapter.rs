// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle trait shared by storage and auth backends.

use async_trait::async_trait;

use crate::error::BiolineError;
use crate::types::{AdapterType, HealthStatus};

/// A swappable backend the server holds for its whole lifetime.
///
/// `/health` polls [`health_check`](Self::health_check) on the adapters it
/// was given.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short name used in logs, e.g. `sqlite`.
    fn name(&self) -> &str;

    fn adapter_type(&self) -> AdapterType;

    async fn health_check(&self) -> Result<HealthStatus, BiolineError>;

    /// Release held resources. Safe to call more than once.
    async fn shutdown(&self) -> Result<(), BiolineError>;
}
