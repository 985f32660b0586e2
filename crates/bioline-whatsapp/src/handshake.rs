// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook subscription handshake (`GET /webhook`).

use serde::Deserialize;

use bioline_core::secret::constant_time_eq;

/// Query parameters sent by the platform when subscribing a webhook.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HandshakeQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Outcome of a handshake, mapped to an HTTP status by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Echo the challenge with 200.
    Accepted(String),
    /// 400: mode, token, or challenge missing.
    MissingParameter,
    /// 403: wrong mode or token mismatch.
    Forbidden,
    /// 500: the server has no verify token configured.
    NotConfigured,
}

impl HandshakeOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Accepted(_) => 200,
            Self::MissingParameter => 400,
            Self::Forbidden => 403,
            Self::NotConfigured => 500,
        }
    }
}

/// Decide a handshake.
///
/// Checked in order: server configuration, parameter presence, then mode
/// and token. Empty parameters count as missing.
pub fn verify_handshake(configured_token: Option<&str>, query: &HandshakeQuery) -> HandshakeOutcome {
    let Some(expected) = configured_token.filter(|t| !t.is_empty()) else {
        tracing::error!("webhook handshake attempted but no verify token is configured");
        return HandshakeOutcome::NotConfigured;
    };

    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);
    let (Some(mode), Some(token), Some(challenge)) = (
        present(&query.mode),
        present(&query.verify_token),
        present(&query.challenge),
    ) else {
        return HandshakeOutcome::MissingParameter;
    };

    if mode != "subscribe" || !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        tracing::warn!(%mode, "webhook handshake rejected");
        return HandshakeOutcome::Forbidden;
    }

    tracing::info!("webhook subscription verified");
    HandshakeOutcome::Accepted(challenge)
}
