// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media acquisition contract.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::RelayError;

/// Two independent ways of getting an image for an offer.
///
/// The relay races them and keeps whichever produces a file first.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Downloads the product image from its canonical page.
    async fn from_product_page(&self, canonical_url: &str) -> Result<Option<PathBuf>, RelayError>;

    /// Captures the image attached to the source channel's latest message.
    async fn from_source_message(&self, source: &str) -> Result<Option<PathBuf>, RelayError>;
}
