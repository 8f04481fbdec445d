// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the linkrelay affiliate relay: bounded
//! fixed-backoff retry and a first-success race between two lookups.

pub mod race;
pub mod retry;

pub use race::first_success;
pub use retry::RetryPolicy;
