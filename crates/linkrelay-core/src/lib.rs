// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the linkrelay affiliate relay.
//!
//! This crate provides the error taxonomy, the data model and the collaborator
//! traits (automation driver, channels, media, clock) used throughout the
//! workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{RelayError, ResolutionKind, RestartReason};
pub use types::{
    AccountCredential, ContentFingerprint, EndpointRequest, EndpointResponse, FingerprintSource,
    HttpMethod, MessageFingerprint, OutboundOffer, Platform, ProductReference, ResolvedLink,
    SessionToken, SourceMessage,
};

pub use traits::{
    AutomationDriver, Clock, Dispatcher, MediaProvider, MessageSource, SessionLauncher,
    SystemClock,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn product_reference_key_uses_platform_tag() {
        let reference = ProductReference::new(Platform::MarketA, "MLB999");
        assert_eq!(reference.key(), "A_MLB999");
        let reference = ProductReference::new(Platform::MarketB, "B00TESTX10");
        assert_eq!(reference.key(), "B_B00TESTX10");
    }

    #[test]
    fn platform_round_trips_through_tag() {
        for platform in [Platform::MarketA, Platform::MarketB, Platform::Generic] {
            let parsed = Platform::from_str(&platform.to_string()).expect("should parse back");
            assert_eq!(platform, parsed);
        }
    }

    #[test]
    fn session_token_debug_is_redacted() {
        let token = SessionToken::new("csrf-secret");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("csrf-secret"));
        assert_eq!(token.as_str(), "csrf-secret");
    }

    #[test]
    fn endpoint_response_classification() {
        let ok = EndpointResponse {
            status: 201,
            body: String::new(),
        };
        let forbidden = EndpointResponse {
            status: 403,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!ok.is_auth_rejection());
        assert!(forbidden.is_auth_rejection());
        assert!(!forbidden.is_success());
    }

    #[test]
    fn account_credential_deserializes_with_defaults() {
        let json = r#"{"name":"main","affiliate_tag":"tag-1"}"#;
        let account: AccountCredential = serde_json::from_str(json).expect("valid account");
        assert_eq!(account.name, "main");
        assert!(account.session_profile.is_empty());
        assert!(!account.uses_shared_session);
    }

    #[test]
    fn all_collaborator_traits_are_exported() {
        fn _assert_driver<T: AutomationDriver>() {}
        fn _assert_launcher<T: SessionLauncher>() {}
        fn _assert_source<T: MessageSource>() {}
        fn _assert_dispatcher<T: Dispatcher>() {}
        fn _assert_media<T: MediaProvider>() {}
        fn _assert_clock<T: Clock>() {}
    }
}
