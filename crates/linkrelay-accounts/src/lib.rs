// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account-side state of the relay: per-account session tokens and the
//! timed rotation between credentialed accounts.

pub mod rotation;
pub mod token_cache;

pub use rotation::{ActiveSession, RotationManager};
pub use token_cache::{NO_TOKEN_FOUND, TokenCache, TokenCacheStats};
