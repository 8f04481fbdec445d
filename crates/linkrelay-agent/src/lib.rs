// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay loop for the linkrelay affiliate relay.
//!
//! The [`Poller`] is the central coordinator that:
//! - Checks every source/destination pair once per cycle, in order
//! - Hands new messages to the [`Relay`] pipeline (resolve, dedup, dispatch)
//! - Bounds each cycle with a deadline and escalates stuck or failing cycles
//!   as a restart request
//! - Stops between cycles on cancellation

pub mod poller;
pub mod relay;
pub mod shutdown;

pub use poller::{CycleReport, Poller};
pub use relay::{Relay, RelayOutcome};
pub use shutdown::install_signal_handler;
