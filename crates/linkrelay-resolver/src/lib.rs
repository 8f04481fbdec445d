// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Link resolution engine for the linkrelay affiliate relay.

pub mod engine;
pub mod response;

pub use engine::LinkResolver;
pub use response::extract_short_link;
