// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook ingestion: handshake and event delivery.
//!
//! Once a delivery passes the signature check and parses as JSON, nothing
//! that happens afterwards is reported to the platform. Failures are
//! logged, counted, and written to the dead-letter table so the platform
//! never retries a delivery because of an internal fault.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use bioline_config::model::WhatsAppConfig;
use bioline_core::types::{AppendOutcome, Direction, NewMessage};
use bioline_core::{AccountDirectory, BiolineError, ConversationStore};

use crate::handshake::{verify_handshake, HandshakeOutcome, HandshakeQuery};
use crate::payload::{parse_delivery, ChangeBatch, Delivery};
use crate::recording;
use crate::signature::check_delivery;

/// Counts describing what happened to one delivery.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub stored: usize,
    pub duplicates: usize,
    pub skipped_changes: usize,
    pub skipped_messages: usize,
    pub failed: usize,
}

/// Accepts platform webhook calls and records inbound messages.
pub struct WebhookIngestor {
    accounts: Arc<dyn AccountDirectory>,
    store: Arc<dyn ConversationStore>,
    verify_token: Option<String>,
    app_secret: Option<String>,
}

impl WebhookIngestor {
    pub fn new(
        config: &WhatsAppConfig,
        accounts: Arc<dyn AccountDirectory>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            accounts,
            store,
            verify_token: config.verify_token.clone(),
            app_secret: config.app_secret.clone(),
        }
    }

    /// Answer a subscription handshake.
    pub fn handshake(&self, query: &HandshakeQuery) -> HandshakeOutcome {
        verify_handshake(self.verify_token.as_deref(), query)
    }

    /// Handle one event delivery.
    ///
    /// Returns `SignatureInvalid` or `MalformedPayload` before touching
    /// storage; any later failure is absorbed into the report.
    pub async fn receive(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<DeliveryReport, BiolineError> {
        check_delivery(self.app_secret.as_deref(), body, signature)?;
        let delivery = parse_delivery(body).inspect_err(|e| {
            warn!(error = %e, "rejecting webhook body");
        })?;

        let report = self.ingest(&delivery, body).await;
        info!(
            stored = report.stored,
            duplicates = report.duplicates,
            skipped_changes = report.skipped_changes,
            skipped_messages = report.skipped_messages,
            failed = report.failed,
            "webhook delivery processed"
        );
        Ok(report)
    }

    async fn ingest(&self, delivery: &Delivery, body: &[u8]) -> DeliveryReport {
        let mut report = DeliveryReport {
            skipped_changes: delivery.skipped_changes,
            ..DeliveryReport::default()
        };
        for _ in 0..delivery.skipped_changes {
            recording::record_skipped("malformed_change");
        }

        // Sequential on purpose: rows of one delivery keep their payload order.
        let mut failures = Vec::new();
        for batch in &delivery.changes {
            self.ingest_change(batch, delivery, &mut report, &mut failures)
                .await;
        }
        if !failures.is_empty() {
            self.dead_letter(&failures, report.failed, body).await;
        }
        report
    }

    async fn ingest_change(
        &self,
        batch: &ChangeBatch,
        delivery: &Delivery,
        report: &mut DeliveryReport,
        failures: &mut Vec<ChangeFailure>,
    ) {
        report.skipped_messages += batch.skipped_messages;
        for _ in 0..batch.skipped_messages {
            recording::record_skipped("malformed_message");
        }
        if batch.messages.is_empty() {
            // Status callbacks and similar carry no messages.
            return;
        }

        let pnid = batch.phone_number_id.as_str();
        let owner = match self.accounts.find_by_phone_number_id(pnid).await {
            Ok(Some(account)) => account.owner_user_id,
            Ok(None) => None,
            Err(e) => {
                error!(phone_number_id = pnid, error = %e, "account lookup failed");
                recording::record_failure(e.kind());
                report.failed += batch.messages.len();
                if !failures.iter().any(|f| f.phone_number_id == pnid) {
                    failures.push(ChangeFailure::new(pnid, &e));
                }
                return;
            }
        };
        let Some(owner) = owner else {
            debug!(phone_number_id = pnid, "no owned account for line, skipping change");
            report.skipped_changes += 1;
            recording::record_skipped("unknown_account");
            return;
        };

        for event in &batch.messages {
            let message = NewMessage {
                owner_user_id: owner.clone(),
                phone_number_id: batch.phone_number_id.clone(),
                contact: event.from.clone(),
                direction: Direction::Inbound,
                message_type: event.message_type.clone(),
                text_body: event.text_body.clone(),
                template_name: None,
                template_language: None,
                external_message_id: event.external_id.clone(),
                raw_payload: delivery.payload.clone(),
            };
            match self.store.append_message(&message).await {
                Ok(AppendOutcome::Inserted(row)) => {
                    debug!(id = row.id, contact = %row.contact, "inbound message stored");
                    report.stored += 1;
                    recording::record_stored(Direction::Inbound);
                }
                Ok(AppendOutcome::Duplicate(row)) => {
                    debug!(id = row.id, external_id = ?row.external_message_id, "redelivered message ignored");
                    report.duplicates += 1;
                    recording::record_skipped("duplicate");
                }
                Err(e) => {
                    error!(phone_number_id = pnid, error = %e, "failed to store inbound message");
                    recording::record_failure(e.kind());
                    report.failed += 1;
                    if !failures.iter().any(|f| f.phone_number_id == pnid) {
                        failures.push(ChangeFailure::new(pnid, &e));
                    }
                }
            }
        }
    }

    /// Keep the whole delivery once, however many of its messages failed.
    ///
    /// Replaying it is safe: messages that did get stored come back as
    /// duplicates.
    async fn dead_letter(&self, failures: &[ChangeFailure], failed: usize, body: &[u8]) {
        let pnid = match failures {
            [only] => Some(only.phone_number_id.as_str()),
            _ => None,
        };
        let causes = failures
            .iter()
            .map(|f| format!("{}: {}", f.phone_number_id, f.error))
            .collect::<Vec<_>>()
            .join("; ");
        let summary = format!("{failed} message(s) not stored ({causes})");
        let payload = String::from_utf8_lossy(body);
        if let Err(e) = self.store.record_dead_letter(pnid, &payload, &summary).await {
            error!(error = %e, "failed to record webhook dead letter");
        }
    }
}

/// First failure seen on one line during a delivery.
struct ChangeFailure {
    phone_number_id: String,
    error: String,
}

impl ChangeFailure {
    fn new(phone_number_id: &str, error: &BiolineError) -> Self {
        Self {
            phone_number_id: phone_number_id.to_string(),
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bioline_test_utils::fixtures::{sign_body, text_message_payload};
    use bioline_test_utils::{FlakyStore, TestHarness};
    use serde_json::json;
    use tracing_test::traced_test;

    fn config(secret: Option<&str>) -> WhatsAppConfig {
        WhatsAppConfig {
            verify_token: Some("vt".to_string()),
            app_secret: secret.map(str::to_string),
            ..WhatsAppConfig::default()
        }
    }

    fn ingestor(harness: &TestHarness, secret: Option<&str>) -> WebhookIngestor {
        WebhookIngestor::new(&config(secret), harness.accounts(), harness.store())
    }

    #[tokio::test]
    async fn text_message_for_known_line_is_stored() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.link_account("alice", "P1").await.unwrap();
        let body = serde_json::to_vec(&text_message_payload("P1", "5215500000000", "wamid.1", "hola"))
            .unwrap();

        let report = ingestor(&harness, None).receive(&body, None).await.unwrap();
        assert_eq!(report.stored, 1);

        let rows = harness.thread("alice", "P1", "5215500000000").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text_body.as_deref(), Some("hola"));
        assert_eq!(rows[0].direction, Direction::Inbound);
        assert_eq!(rows[0].external_message_id.as_deref(), Some("wamid.1"));
        // The whole delivery is kept, not just the message.
        assert_eq!(rows[0].raw_payload, serde_json::from_slice::<serde_json::Value>(&body).unwrap());
    }

    #[tokio::test]
    async fn unknown_line_is_skipped_without_error() {
        let harness = TestHarness::builder().build().await.unwrap();
        let body = serde_json::to_vec(&text_message_payload("P404", "C1", "w1", "hi")).unwrap();

        let report = ingestor(&harness, None).receive(&body, None).await.unwrap();
        assert_eq!(report.stored, 0);
        assert_eq!(report.skipped_changes, 1);
        assert!(harness.thread("alice", "P404", "C1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn redelivery_is_idempotent() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.link_account("alice", "P1").await.unwrap();
        let body = serde_json::to_vec(&text_message_payload("P1", "C1", "wamid.X", "once")).unwrap();
        let ingestor = ingestor(&harness, None);

        ingestor.receive(&body, None).await.unwrap();
        let report = ingestor.receive(&body, None).await.unwrap();
        assert_eq!(report.duplicates, 1);
        assert_eq!(harness.thread("alice", "P1", "C1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn signature_is_enforced_when_secret_configured() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.link_account("alice", "P1").await.unwrap();
        let body = serde_json::to_vec(&text_message_payload("P1", "C1", "w1", "hi")).unwrap();
        let ingestor = ingestor(&harness, Some("app-secret"));

        let err = ingestor.receive(&body, None).await.unwrap_err();
        assert!(matches!(err, BiolineError::SignatureInvalid));
        let err = ingestor
            .receive(&body, Some(&sign_body(&body, "wrong")))
            .await
            .unwrap_err();
        assert!(matches!(err, BiolineError::SignatureInvalid));
        assert!(harness.thread("alice", "P1", "C1").await.unwrap().is_empty());

        let report = ingestor
            .receive(&body, Some(&sign_body(&body, "app-secret")))
            .await
            .unwrap();
        assert_eq!(report.stored, 1);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let harness = TestHarness::builder().build().await.unwrap();
        let err = ingestor(&harness, None)
            .receive(b"<xml/>", None)
            .await
            .unwrap_err();
        assert!(matches!(err, BiolineError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn messages_within_delivery_keep_payload_order() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.link_account("alice", "P1").await.unwrap();
        let body = serde_json::to_vec(&json!({ "entry": [{ "changes": [{ "value": {
            "metadata": { "phone_number_id": "P1" },
            "messages": [
                { "from": "C1", "id": "a", "type": "text", "text": { "body": "first" } },
                { "from": "C1", "id": "b", "type": "text", "text": { "body": "second" } },
                { "from": "C1", "id": "c", "type": "sticker" }
            ]
        }}]}]}))
        .unwrap();

        let report = ingestor(&harness, None).receive(&body, None).await.unwrap();
        assert_eq!(report.stored, 3);
        let rows = harness.thread("alice", "P1", "C1").await.unwrap();
        let ids: Vec<_> = rows.iter().map(|m| m.external_message_id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(rows[2].message_type, "sticker");
        assert_eq!(rows[2].text_body, None);
    }

    #[tokio::test]
    #[traced_test]
    async fn storage_failure_is_absorbed_and_dead_lettered() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.link_account("alice", "P1").await.unwrap();
        let flaky = Arc::new(FlakyStore::new(harness.storage()));
        flaky.fail_appends(true);
        let ingestor = WebhookIngestor::new(&config(None), harness.accounts(), flaky.clone());
        let body = serde_json::to_vec(&text_message_payload("P1", "C1", "w1", "lost")).unwrap();

        let report = ingestor.receive(&body, None).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.stored, 0);
        assert!(logs_contain("failed to store inbound message"));

        let letters = harness.storage().list_dead_letters(10).await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].phone_number_id.as_deref(), Some("P1"));
        assert_eq!(letters[0].payload.as_bytes(), body.as_slice());
    }

    #[tokio::test]
    async fn delivery_with_several_failures_is_dead_lettered_once() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.link_account("alice", "P1").await.unwrap();
        let flaky = Arc::new(FlakyStore::new(harness.storage()));
        flaky.fail_appends(true);
        let ingestor = WebhookIngestor::new(&config(None), harness.accounts(), flaky.clone());
        let body = serde_json::to_vec(&json!({ "entry": [{ "changes": [{ "value": {
            "metadata": { "phone_number_id": "P1" },
            "messages": [
                { "from": "C1", "id": "a", "type": "text", "text": { "body": "one" } },
                { "from": "C1", "id": "b", "type": "text", "text": { "body": "two" } },
                { "from": "C2", "id": "c", "type": "text", "text": { "body": "three" } }
            ]
        }}]}]}))
        .unwrap();

        let report = ingestor.receive(&body, None).await.unwrap();
        assert_eq!(report.failed, 3);

        let letters = harness.storage().list_dead_letters(10).await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].phone_number_id.as_deref(), Some("P1"));
        assert!(letters[0].error.starts_with("3 message(s) not stored"), "{}", letters[0].error);
    }

    #[tokio::test]
    async fn messages_with_blank_ids_are_all_stored() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.link_account("alice", "P1").await.unwrap();
        let body = serde_json::to_vec(&json!({ "entry": [{ "changes": [{ "value": {
            "metadata": { "phone_number_id": "P1" },
            "messages": [
                { "from": "C1", "id": "", "type": "text", "text": { "body": "first" } },
                { "from": "C1", "id": "", "type": "text", "text": { "body": "second" } }
            ]
        }}]}]}))
        .unwrap();

        let report = ingestor(&harness, None).receive(&body, None).await.unwrap();
        assert_eq!(report.stored, 2);
        assert_eq!(report.duplicates, 0);
        let rows = harness.thread("alice", "P1", "C1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|m| m.external_message_id.is_none()));
    }

    #[tokio::test]
    async fn handshake_uses_configured_token() {
        let harness = TestHarness::builder().build().await.unwrap();
        let query = HandshakeQuery {
            mode: Some("subscribe".into()),
            verify_token: Some("vt".into()),
            challenge: Some("42".into()),
        };
        assert_eq!(
            ingestor(&harness, None).handshake(&query),
            HandshakeOutcome::Accepted("42".into())
        );
    }
}
