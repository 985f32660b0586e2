// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage, WhatsApp, and gateway crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Auth,
}

/// Direction of a message relative to the linked account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Well-known platform message types. Any other string is stored verbatim.
pub mod message_type {
    pub const TEXT: &str = "text";
    pub const TEMPLATE: &str = "template";
    pub const UNKNOWN: &str = "unknown";
}

/// One linked external messaging line.
#[derive(Clone, Serialize, Deserialize)]
pub struct MessagingAccount {
    pub id: String,
    /// `None` until the line is claimed.
    pub owner_user_id: Option<String>,
    /// Platform-assigned, unique across the system.
    pub phone_number_id: String,
    /// Business account id, required for template operations.
    pub waba_id: Option<String>,
    pub label: String,
    /// Bearer credential for the platform API. Never serialized.
    #[serde(skip_serializing, default)]
    pub access_token: String,
    pub token_expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl std::fmt::Debug for MessagingAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingAccount")
            .field("id", &self.id)
            .field("owner_user_id", &self.owner_user_id)
            .field("phone_number_id", &self.phone_number_id)
            .field("waba_id", &self.waba_id)
            .field("label", &self.label)
            .field("access_token", &"[redacted]")
            .field("token_expires_at", &self.token_expires_at)
            .finish()
    }
}

/// Manual-connect / reconnect request for a messaging line.
#[derive(Clone, Deserialize)]
pub struct ConnectRequest {
    pub phone_number_id: String,
    #[serde(default)]
    pub waba_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub token_expires_at: Option<String>,
}

impl std::fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("phone_number_id", &self.phone_number_id)
            .field("waba_id", &self.waba_id)
            .field("label", &self.label)
            .field("access_token", &"[redacted]")
            .field("token_expires_at", &self.token_expires_at)
            .finish()
    }
}

/// A message about to be appended to the conversation log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub owner_user_id: String,
    pub phone_number_id: String,
    /// External phone number of the counterparty.
    pub contact: String,
    pub direction: Direction,
    pub message_type: String,
    pub text_body: Option<String>,
    pub template_name: Option<String>,
    pub template_language: Option<String>,
    pub external_message_id: Option<String>,
    /// Full platform event or response, kept for audit.
    pub raw_payload: serde_json::Value,
}

/// A persisted, immutable message row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub owner_user_id: String,
    pub phone_number_id: String,
    pub contact: String,
    pub direction: Direction,
    pub message_type: String,
    pub text_body: Option<String>,
    pub template_name: Option<String>,
    pub template_language: Option<String>,
    pub external_message_id: Option<String>,
    pub raw_payload: serde_json::Value,
    /// RFC 3339 UTC with microseconds, strictly increasing per row.
    pub created_at: String,
}

/// Result of an append: either a fresh row or the row an earlier delivery wrote.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Inserted(Message),
    Duplicate(Message),
}

impl AppendOutcome {
    pub fn message(&self) -> &Message {
        match self {
            Self::Inserted(m) | Self::Duplicate(m) => m,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            Self::Inserted(m) | Self::Duplicate(m) => m,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Derived summary of one conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub contact: String,
    pub last_message_at: String,
    pub last_text: Option<String>,
}

/// A webhook delivery that could not be persisted, kept for replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub id: i64,
    pub phone_number_id: Option<String>,
    pub payload: String,
    pub error: String,
    pub created_at: String,
}

/// Bearer credential presented by an API caller.
#[derive(Clone)]
pub struct AuthToken(pub String);

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([redacted])")
    }
}

/// A verified identity from an auth adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub user_id: UserId,
}
