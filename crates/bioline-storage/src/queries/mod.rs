// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the storage entities.

pub mod accounts;
pub mod dead_letters;
pub mod messages;
