// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is
//! a no-op.

use metrics::describe_counter;

use bioline_core::Direction;

/// Register descriptions for every counter this crate emits.
pub fn register_metrics() {
    describe_counter!(
        "bioline_messages_stored_total",
        "Messages appended to the conversation log"
    );
    describe_counter!(
        "bioline_webhook_skipped_total",
        "Webhook changes or messages skipped during ingestion"
    );
    describe_counter!(
        "bioline_webhook_failures_total",
        "Webhook messages that failed to persist"
    );
    describe_counter!(
        "bioline_outbound_send_total",
        "Outbound send attempts by outcome"
    );
}

pub fn record_stored(direction: Direction) {
    metrics::counter!("bioline_messages_stored_total", "direction" => direction.to_string())
        .increment(1);
}

pub fn record_skipped(reason: &'static str) {
    metrics::counter!("bioline_webhook_skipped_total", "reason" => reason).increment(1);
}

pub fn record_failure(kind: &'static str) {
    metrics::counter!("bioline_webhook_failures_total", "kind" => kind).increment(1);
}

pub fn record_send(outcome: &'static str) {
    metrics::counter!("bioline_outbound_send_total", "outcome" => outcome).increment(1);
}
