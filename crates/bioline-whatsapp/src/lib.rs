// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Business Cloud integration for Bioline.
//!
//! - [`signature`]: `X-Hub-Signature-256` verification over raw bodies
//! - [`handshake`]: webhook subscription verification
//! - [`payload`]: typed parsing of `entry[].changes[].value` deliveries
//! - [`ingest`]: [`WebhookIngestor`], which records inbound messages
//! - [`outbound`]: [`OutboundSender`], text and template sends
//! - [`templates`]: [`TemplateCatalog`]

pub mod client;
pub mod handshake;
pub mod ingest;
pub mod outbound;
pub mod payload;
pub mod recording;
pub mod signature;
pub mod templates;

pub use client::GraphClient;
pub use handshake::{HandshakeOutcome, HandshakeQuery};
pub use ingest::{DeliveryReport, WebhookIngestor};
pub use outbound::{OutboundSender, SendReceipt, SendRequest, TemplateRef};
pub use templates::TemplateCatalog;
