// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the relay core consumes.
//!
//! Everything with I/O behind it (browser automation, chat channels, media
//! capture, wall-clock time) is reached through one of these, using
//! `#[async_trait]` for dynamic dispatch.

pub mod channel;
pub mod clock;
pub mod driver;
pub mod media;

pub use channel::{Dispatcher, MessageSource};
pub use clock::{Clock, SystemClock};
pub use driver::{AutomationDriver, SessionLauncher};
pub use media::MediaProvider;
