// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Bioline integration tests.
//!
//! - [`TestHarness`]: temp SQLite storage plus a matching configuration
//! - [`FlakyStore`]: a conversation store whose writes can be made to fail
//! - [`fixtures`]: webhook payload builders and body signing

pub mod fixtures;
pub mod flaky_store;
pub mod harness;

pub use flaky_store::FlakyStore;
pub use harness::{TestHarness, TestHarnessBuilder};
