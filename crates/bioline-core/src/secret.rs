// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Comparison helpers for shared secrets.

/// Byte equality whose running time does not depend on where the inputs
/// first differ. Only the length comparison can exit early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
