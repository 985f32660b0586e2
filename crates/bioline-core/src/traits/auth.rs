// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication adapter trait: resolves a caller to a user identity.

use async_trait::async_trait;

use crate::error::BiolineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AuthIdentity, AuthToken};

/// Maps a bearer credential presented to the HTTP API onto a user id.
///
/// Account ownership and every read are scoped by the id returned here.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Fails with [`BiolineError::Unauthorized`] for unknown tokens.
    async fn authenticate(&self, token: AuthToken) -> Result<AuthIdentity, BiolineError>;
}
