// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for linkrelay.
//!
//! Deterministic stand-ins for every collaborator the relay talks to, so
//! tests run without a browser, a chat network or a real clock.
//!
//! # Components
//!
//! - [`MockDriver`] / [`MockLauncher`] - scripted automation sessions
//! - [`MockSource`] / [`MockDispatcher`] - channel ends with injection and capture
//! - [`MockMedia`] - media lookups with fixed latency
//! - [`ManualClock`] - wall clock moved by hand

pub mod manual_clock;
pub mod mock_channel;
pub mod mock_driver;

pub use manual_clock::ManualClock;
pub use mock_channel::{MockDispatcher, MockMedia, MockSource};
pub use mock_driver::{MockDriver, MockLauncher};
