// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed parsing of webhook delivery bodies.
//!
//! The envelope is `entry[].changes[].value` with `metadata.phone_number_id`
//! and an optional `messages[]`. The body must be JSON; below that, a change
//! or message that does not fit the expected shape is counted and skipped
//! instead of failing the whole delivery.

use serde::Deserialize;
use serde_json::Value;

use bioline_core::types::message_type;
use bioline_core::BiolineError;

#[derive(Debug, Default, Deserialize)]
struct WireValue {
    #[serde(default)]
    metadata: Option<WireMetadata>,
    #[serde(default)]
    messages: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    phone_number_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    text: Option<WireText>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    #[serde(default)]
    body: Option<String>,
}

/// One inbound message, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub from: String,
    pub external_id: Option<String>,
    pub message_type: String,
    /// Present only for `text` messages that carry a body.
    pub text_body: Option<String>,
}

/// The messages of one change, all addressed to the same line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub phone_number_id: String,
    pub messages: Vec<InboundEvent>,
    /// Messages dropped for a missing sender or an unexpected shape.
    pub skipped_messages: usize,
}

/// A parsed delivery plus the original document for audit storage.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub payload: Value,
    pub changes: Vec<ChangeBatch>,
    /// Changes dropped for a missing line id or an unexpected shape.
    pub skipped_changes: usize,
}

/// Parse a raw webhook body.
///
/// Only a body that is not JSON at all is an error.
pub fn parse_delivery(body: &[u8]) -> Result<Delivery, BiolineError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| BiolineError::MalformedPayload(e.to_string()))?;

    let mut changes = Vec::new();
    let mut skipped_changes = 0;

    let entries = payload.get("entry").and_then(Value::as_array);
    for entry in entries.into_iter().flatten() {
        let entry_changes = entry.get("changes").and_then(Value::as_array);
        for change in entry_changes.into_iter().flatten() {
            match parse_change(change) {
                Some(batch) => changes.push(batch),
                None => skipped_changes += 1,
            }
        }
    }

    Ok(Delivery {
        payload,
        changes,
        skipped_changes,
    })
}

fn parse_change(change: &Value) -> Option<ChangeBatch> {
    let value: WireValue = serde_json::from_value(change.get("value")?.clone()).ok()?;
    let phone_number_id = value
        .metadata
        .and_then(|m| m.phone_number_id)
        .filter(|id| !id.is_empty())?;

    let mut messages = Vec::new();
    let mut skipped_messages = 0;
    for raw in value.messages.unwrap_or_default() {
        match parse_message(raw) {
            Some(event) => messages.push(event),
            None => skipped_messages += 1,
        }
    }

    Some(ChangeBatch {
        phone_number_id,
        messages,
        skipped_messages,
    })
}

fn parse_message(raw: Value) -> Option<InboundEvent> {
    let wire: WireMessage = serde_json::from_value(raw).ok()?;
    let from = wire.from.filter(|f| !f.is_empty())?;
    let message_type = wire
        .kind
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| message_type::UNKNOWN.to_string());
    let text_body = if message_type == message_type::TEXT {
        wire.text.and_then(|t| t.body)
    } else {
        None
    };
    Some(InboundEvent {
        from,
        external_id: wire.id.filter(|id| !id.is_empty()),
        message_type,
        text_body,
    })
}
