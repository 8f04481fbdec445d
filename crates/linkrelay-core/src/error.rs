// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every linkrelay crate.

use std::path::PathBuf;

use strum::Display;
use thiserror::Error;

/// Why a single link resolution attempt failed.
///
/// Rendered in kebab-case (`not-a-product-page`, `no-auth`, ...) so log lines
/// stay grep-friendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ResolutionKind {
    /// The landing page never reached a canonical product URL.
    NotAProductPage,
    /// No session token could be obtained for the account.
    NoAuth,
    /// The link-creation endpoint rejected the token (401/403).
    Unauthorized,
    /// The link-creation endpoint answered with another non-2xx status.
    EndpointStatus,
    /// The endpoint answered 2xx but the body had no recognizable link.
    BadResponse,
    /// A driver call failed mid-attempt.
    Driver,
}

/// Why the polling cycle asked for a full environment restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RestartReason {
    /// The sweep over all sources exceeded the cycle timeout.
    CycleTimeout,
    /// Every source in the cycle failed with a driver error.
    RepeatedDriverFailure,
}

/// The primary error type used across the relay core.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Configuration errors (invalid values, missing accounts, bad patterns).
    #[error("configuration error: {0}")]
    Config(String),

    /// Session token missing or rejected for an account.
    #[error("auth error for account {account}: {reason}")]
    Auth { account: String, reason: String },

    /// A link could not be turned into an affiliate link.
    #[error("link resolution failed ({kind}): {detail}")]
    Resolution { kind: ResolutionKind, detail: String },

    /// Automation driver failure (navigation, action or endpoint call).
    #[error("driver error: {message}")]
    Driver {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An isolated session for the active account could not be established.
    #[error("session unavailable for account {account}: {message}")]
    Session { account: String, message: String },

    /// Reading or writing a persisted store failed.
    #[error("persistence error at {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The outbound channel refused or failed to deliver an offer.
    #[error("dispatch to {destination} failed: {message}")]
    Dispatch { destination: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The automation environment must be restarted by the supervisor.
    #[error("restart requested: {reason}")]
    RestartRequested { reason: RestartReason },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Shorthand for a [`RelayError::Resolution`].
    pub fn resolution(kind: ResolutionKind, detail: impl Into<String>) -> Self {
        Self::Resolution {
            kind,
            detail: detail.into(),
        }
    }

    /// Shorthand for a [`RelayError::Driver`] without an underlying source.
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
            source: None,
        }
    }

    /// Whether a bounded retry of the same operation can reasonably succeed.
    ///
    /// Configuration mistakes and restart escalations are never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Config(_) | Self::RestartRequested { .. } | Self::Internal(_)
        )
    }

    /// Whether this error originated in the automation driver.
    pub fn is_driver(&self) -> bool {
        matches!(
            self,
            Self::Driver { .. }
                | Self::Resolution {
                    kind: ResolutionKind::Driver,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_kind_renders_kebab_case() {
        assert_eq!(ResolutionKind::NotAProductPage.to_string(), "not-a-product-page");
        assert_eq!(ResolutionKind::NoAuth.to_string(), "no-auth");
        assert_eq!(ResolutionKind::BadResponse.to_string(), "bad-response");
    }

    #[test]
    fn resolution_error_message_carries_kind_and_detail() {
        let err = RelayError::resolution(ResolutionKind::EndpointStatus, "500: boom");
        assert_eq!(
            err.to_string(),
            "link resolution failed (endpoint-status): 500: boom"
        );
    }

    #[test]
    fn config_and_restart_are_not_retryable() {
        assert!(!RelayError::Config("x".into()).is_retryable());
        assert!(
            !RelayError::RestartRequested {
                reason: RestartReason::CycleTimeout
            }
            .is_retryable()
        );
        assert!(RelayError::driver("navigation timeout").is_retryable());
        assert!(RelayError::resolution(ResolutionKind::Unauthorized, "403").is_retryable());
    }

    #[test]
    fn driver_errors_are_detected_through_resolution() {
        assert!(RelayError::driver("x").is_driver());
        assert!(RelayError::resolution(ResolutionKind::Driver, "x").is_driver());
        assert!(!RelayError::resolution(ResolutionKind::NoAuth, "x").is_driver());
    }
}
