// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Bioline messaging service.

use thiserror::Error;

/// The primary error type used across all Bioline traits and core operations.
#[derive(Debug, Error)]
pub enum BiolineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Inbound webhook payload failed the keyed-digest authenticity check.
    #[error("webhook signature invalid")]
    SignatureInvalid,

    /// Inbound webhook body was not valid JSON.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A request is missing required fields or carries invalid values.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The messaging account does not exist or is not owned by the caller.
    ///
    /// The two cases are deliberately indistinguishable to callers.
    #[error("messaging account not found")]
    AccountNotFound,

    /// The external line is already claimed by another user.
    #[error("phone number {phone_number_id} is already linked to another user")]
    AccountClaimed { phone_number_id: String },

    /// The messaging platform rejected or failed a request.
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Caller could not be resolved to a user identity.
    #[error("unauthorized")]
    Unauthorized,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BiolineError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Short machine-readable kind, used as a log/metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Storage { .. } => "storage",
            Self::SignatureInvalid => "signature_invalid",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::Validation(_) => "validation",
            Self::AccountNotFound => "account_not_found",
            Self::AccountClaimed { .. } => "account_claimed",
            Self::Upstream { .. } => "upstream",
            Self::Timeout { .. } => "timeout",
            Self::Unauthorized => "unauthorized",
            Self::Internal(_) => "internal",
        }
    }
}
