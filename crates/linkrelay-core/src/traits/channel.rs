// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging channel contracts (source polling and outbound delivery).

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::{OutboundOffer, SourceMessage};

/// Reads the newest message of a source channel.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Returns `None` when the channel has no messages at all.
    async fn latest_message(&self, source: &str) -> Result<Option<SourceMessage>, RelayError>;
}

/// Delivers a rewritten offer to a destination channel.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Resolves only once delivery is confirmed.
    async fn dispatch(&self, offer: &OutboundOffer) -> Result<(), RelayError>;
}
