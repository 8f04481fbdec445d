// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared by the relay core.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A credentialed marketplace account the relay can generate links for.
///
/// Loaded once from configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountCredential {
    /// Unique account name, used as the token cache key.
    pub name: String,

    /// Opaque reference to the account's browser/session profile.
    #[serde(default)]
    pub session_profile: String,

    /// Affiliate tag credited for links generated with this account.
    pub affiliate_tag: String,

    /// `true` when the account rides the caller's already-authenticated
    /// session instead of needing an isolated one.
    #[serde(default)]
    pub uses_shared_session: bool,
}

/// An authorization token bound to one account.
///
/// Tokens carry no expiry; a 401/403 on use is the only signal that one went
/// stale. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

/// Marketplace family a product identifier belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Platform {
    /// Numeric catalog codes such as `MLB123456`.
    #[strum(to_string = "A")]
    MarketA,
    /// Ten-character alphanumeric codes addressed via `/dp/{code}`.
    #[strum(to_string = "B")]
    MarketB,
    #[strum(to_string = "GENERIC")]
    Generic,
}

/// Canonical identity of a product, independent of the URL it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductReference {
    pub platform: Platform,
    pub id: String,
}

impl ProductReference {
    pub fn new(platform: Platform, id: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
        }
    }

    /// Stable `{PLATFORM}_{ID}` key, e.g. `A_MLB999`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.platform, self.id)
    }
}

/// Result of resolving one shared link into an affiliate link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// The link exactly as it appeared in the source message.
    pub original_url: String,
    /// The revenue-tracked replacement.
    pub affiliate_url: String,
    /// Canonical product page, used for auxiliary media lookups.
    pub canonical_url: String,
}

/// Short digest identifying an offer's content for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentFingerprint(pub String);

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One input a [`ContentFingerprint`] can be derived from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FingerprintSource {
    /// Canonical product identifier found in any of the message's URLs.
    ProductId,
    /// Sorted, de-duplicated set of the message's URLs.
    UrlSet,
    /// The raw message text.
    Text,
}

/// Digest of a source message's text and links, used for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageFingerprint(pub String);

impl fmt::Display for MessageFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The latest message observed in a source channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMessage {
    pub text: String,
    /// Links taken from anchors; empty when the channel only exposes text.
    pub urls: Vec<String>,
    pub has_media: bool,
}

/// A rewritten offer ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundOffer {
    pub destination: String,
    pub text: String,
    pub media: Option<PathBuf>,
}

/// HTTP method for [`EndpointRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

/// A raw endpoint call issued through the automation driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Status and body of an endpoint call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: String,
}

impl EndpointResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}
