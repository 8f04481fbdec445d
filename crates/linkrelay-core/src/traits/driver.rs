// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation driver contract for the marketplace side.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::types::{AccountCredential, EndpointRequest, EndpointResponse};

/// Page-level automation primitives.
///
/// The relay never assumes a particular markup structure; element discovery
/// is entirely the driver's business. Every method is a suspension point.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Navigates to `url`, following redirects, and returns the landing URL.
    async fn navigate(&self, url: &str) -> Result<String, RelayError>;

    /// Returns the URL of the page the driver currently shows.
    async fn current_url(&self) -> Result<String, RelayError>;

    /// Best-effort click on the first element matching any hint.
    ///
    /// Returns whether an action actually fired.
    async fn perform_named_action(&self, hints: &[String]) -> Result<bool, RelayError>;

    /// Reads an embedded value (meta tag, data attribute, ...) from the page.
    async fn read_page_marker(&self, hints: &[String]) -> Result<Option<String>, RelayError>;

    /// Issues a raw HTTP call within the driver's session.
    async fn call_endpoint(&self, request: EndpointRequest)
    -> Result<EndpointResponse, RelayError>;

    /// Releases any resources held by the session.
    async fn close(&self) -> Result<(), RelayError> {
        Ok(())
    }
}

/// Opens isolated sessions for accounts that cannot share the primary one.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn open_isolated(
        &self,
        account: &AccountCredential,
    ) -> Result<Arc<dyn AutomationDriver>, RelayError>;
}
