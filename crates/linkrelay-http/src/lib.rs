// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain HTTP automation driver for the linkrelay affiliate relay.
//!
//! [`HttpDriver`] treats each navigation as a GET and the fetched markup as
//! the current page. It covers marketplaces whose redirects, product pages
//! and token markers are reachable without running scripts.

pub mod driver;
pub mod launcher;
pub mod page;

pub use driver::HttpDriver;
pub use launcher::HttpLauncher;
