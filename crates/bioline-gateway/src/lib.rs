// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for Bioline.
//!
//! Exposes the webhook receiver for the messaging platform and the
//! authenticated send and read APIs polled by the web client.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::StaticTokenAuth;
pub use error::{ApiError, ErrorResponse};
pub use server::{build_router, start_server, GatewayState, HealthState};
