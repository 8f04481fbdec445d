// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A short link travels from a source channel to two destinations.

use std::sync::Arc;
use std::time::Duration;

use linkrelay_accounts::{RotationManager, TokenCache};
use linkrelay_agent::{Relay, RelayOutcome};
use linkrelay_config::model::{AuthConfig, ChannelPair, ResolverConfig};
use linkrelay_core::{AccountCredential, SourceMessage};
use linkrelay_extract::fingerprint::identity_basis;
use linkrelay_extract::{FingerprintPolicy, content_fingerprint};
use linkrelay_resolver::LinkResolver;
use linkrelay_storage::{CursorStore, DedupCache};
use linkrelay_test_utils::{ManualClock, MockDispatcher, MockDriver, MockLauncher, MockSource};

const SHORT: &str = "https://x.example/sec/AB12";
const PRODUCT: &str = "https://x.example/item/MLB999";

fn pair(source: &str, destination: &str) -> ChannelPair {
    ChannelPair {
        source: source.into(),
        destination: destination.into(),
        description: String::new(),
    }
}

fn message(text: &str) -> SourceMessage {
    SourceMessage {
        text: format!("{text} {SHORT}"),
        urls: Vec::new(),
        has_media: false,
    }
}

#[tokio::test(start_paused = true)]
async fn offer_is_deduplicated_per_destination() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::default());
    let driver = MockDriver::new()
        .with_route(SHORT, PRODUCT)
        .with_marker("csrf", "tok")
        .with_response(200, r#"{"id":"ZZ9"}"#)
        .with_response(200, r#"{"id":"ZZ9"}"#)
        .with_response(200, r#"{"id":"ZZ9"}"#);

    let tokens = Arc::new(TokenCache::new(AuthConfig {
        url: "https://auth.example/panel".into(),
        token_markers: vec!["csrf".into()],
        token_header: "x-csrf-token".into(),
    }));
    let rotation = Arc::new(
        RotationManager::new(
            vec![AccountCredential {
                name: "main".into(),
                session_profile: String::new(),
                affiliate_tag: "main-20".into(),
                uses_shared_session: true,
            }],
            Duration::from_secs(1800),
            tokens.clone(),
            Arc::new(driver),
            Arc::new(MockLauncher::new()),
        )
        .unwrap(),
    );
    let resolver = Arc::new(
        LinkResolver::new(
            ResolverConfig {
                create_link_url: "https://api.example/create".into(),
                ..ResolverConfig::default()
            },
            "x-csrf-token",
            tokens,
        )
        .unwrap(),
    );
    let dedup = Arc::new(DedupCache::new(
        dir.path().join("dedup_cache.txt"),
        Duration::from_secs(3 * 3600),
        FingerprintPolicy::default(),
        clock.clone(),
    ));
    let source = Arc::new(MockSource::new());
    let dispatcher = Arc::new(MockDispatcher::new());
    let relay = Relay::new(
        source.clone(),
        dispatcher.clone(),
        rotation,
        resolver,
        dedup.clone(),
        Arc::new(CursorStore::new(dir.path().join("state_last_seen.txt"))),
        3,
        Duration::from_secs(8),
    );

    let expected = content_fingerprint("", &[PRODUCT], &FingerprintPolicy::default());
    assert_eq!(
        identity_basis("", &[PRODUCT], &FingerprintPolicy::default()),
        "A_MLB999"
    );

    source.post("Deals", message("Hot deal")).await;
    let first = relay.process_pair(&pair("Deals", "Promo")).await.unwrap();
    assert_eq!(
        first,
        RelayOutcome::Sent {
            fingerprint: expected.clone()
        }
    );
    let sent = dispatcher.sent().await;
    assert_eq!(sent[0].text, "Hot deal https://x.example/sec/ZZ9");

    clock.advance(Duration::from_secs(10 * 60));
    source.post("Deals", message("Still hot")).await;
    let second = relay.process_pair(&pair("Deals", "Promo")).await.unwrap();
    assert_eq!(
        second,
        RelayOutcome::Duplicate {
            fingerprint: expected.clone()
        }
    );

    source.post("Mirror", message("Hot deal")).await;
    let other = relay.process_pair(&pair("Mirror", "Other")).await.unwrap();
    assert_eq!(
        other,
        RelayOutcome::Sent {
            fingerprint: expected
        }
    );
    assert_eq!(dispatcher.sent_count().await, 2);
    assert!(dedup.is_duplicate("Other", "", &[PRODUCT]).await);
}
