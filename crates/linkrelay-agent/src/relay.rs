// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One source/destination pair, one message: detect, resolve, dedup, send.
//!
//! The cursor for a source only moves once the latest message is fully
//! handled. Anything that fails before a confirmed dispatch leaves it where
//! it was, so the same message is picked up again on the next cycle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use linkrelay_accounts::RotationManager;
use linkrelay_config::model::ChannelPair;
use linkrelay_core::{
    ContentFingerprint, Dispatcher, MediaProvider, MessageFingerprint, MessageSource,
    OutboundOffer, RelayError, SourceMessage,
};
use linkrelay_extract::{extract_urls, message_fingerprint, replace_urls};
use linkrelay_resilience::first_success;
use linkrelay_resolver::LinkResolver;
use linkrelay_storage::{CursorStore, DedupCache};

/// What happened to the latest message of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The source has no message with text or links.
    NoMessage,
    /// The latest message was already handled.
    Unchanged,
    /// Nothing in the message is worth rewriting; skipped for good.
    NoCandidateLinks,
    /// The same offer reached this destination within the dedup window.
    Duplicate { fingerprint: ContentFingerprint },
    /// Rewritten and delivered.
    Sent { fingerprint: ContentFingerprint },
    /// No candidate link could be resolved. Retried next cycle.
    LinkGenerationFailed { driver_failure: bool },
    /// The destination refused the offer. Retried next cycle.
    DispatchFailed,
}

impl RelayOutcome {
    /// Whether the source cursor moves past the message.
    pub fn advances_cursor(&self) -> bool {
        matches!(
            self,
            Self::NoCandidateLinks | Self::Duplicate { .. } | Self::Sent { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NoMessage => "no-message",
            Self::Unchanged => "unchanged",
            Self::NoCandidateLinks => "no-candidate-links",
            Self::Duplicate { .. } => "duplicate",
            Self::Sent { .. } => "sent",
            Self::LinkGenerationFailed { .. } => "link-generation-failed",
            Self::DispatchFailed => "dispatch-failed",
        }
    }
}

/// Collaborators and stores shared by every pair.
pub struct Relay {
    source: Arc<dyn MessageSource>,
    dispatcher: Arc<dyn Dispatcher>,
    media: Option<Arc<dyn MediaProvider>>,
    rotation: Arc<RotationManager>,
    resolver: Arc<LinkResolver>,
    dedup: Arc<DedupCache>,
    cursor: Arc<CursorStore>,
    max_links: usize,
    media_timeout: Duration,
}

impl Relay {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn MessageSource>,
        dispatcher: Arc<dyn Dispatcher>,
        rotation: Arc<RotationManager>,
        resolver: Arc<LinkResolver>,
        dedup: Arc<DedupCache>,
        cursor: Arc<CursorStore>,
        max_links: usize,
        media_timeout: Duration,
    ) -> Self {
        Self {
            source,
            dispatcher,
            media: None,
            rotation,
            resolver,
            dedup,
            cursor,
            max_links: max_links.max(1),
            media_timeout,
        }
    }

    /// Attach a media provider; offers from messages with media then carry
    /// an image when one can be obtained in time.
    pub fn with_media(mut self, media: Arc<dyn MediaProvider>) -> Self {
        self.media = Some(media);
        self
    }

    pub fn rotation(&self) -> &Arc<RotationManager> {
        &self.rotation
    }

    /// Check `pair.source` once and forward its latest message if new.
    ///
    /// Errors are reserved for failures that say nothing about the message
    /// itself: the source could not be read, or no session was available.
    pub async fn process_pair(&self, pair: &ChannelPair) -> Result<RelayOutcome, RelayError> {
        let Some(message) = self.source.latest_message(&pair.source).await? else {
            return Ok(RelayOutcome::NoMessage);
        };
        let urls = message_urls(&message);
        if message.text.trim().is_empty() && urls.is_empty() {
            return Ok(RelayOutcome::NoMessage);
        }

        let message_fp = message_fingerprint(&message.text, &urls);
        if self.cursor.get(&pair.source).await.as_ref() == Some(&message_fp) {
            debug!(source = %pair.source, "latest message already handled");
            return Ok(RelayOutcome::Unchanged);
        }
        info!(source = %pair.source, fingerprint = %message_fp, "new message detected");

        let outcome = self.forward(pair, &message, &urls).await?;
        if outcome.advances_cursor() {
            self.advance(&pair.source, &message_fp).await;
        } else {
            warn!(
                source = %pair.source,
                outcome = outcome.name(),
                "message not forwarded, will retry next cycle"
            );
        }
        Ok(outcome)
    }

    async fn forward(
        &self,
        pair: &ChannelPair,
        message: &SourceMessage,
        urls: &[String],
    ) -> Result<RelayOutcome, RelayError> {
        let candidates: Vec<&String> = urls
            .iter()
            .filter(|u| self.resolver.is_candidate(u))
            .take(self.max_links)
            .collect();
        if candidates.is_empty() {
            info!(source = %pair.source, "no candidate links, skipping message");
            return Ok(RelayOutcome::NoCandidateLinks);
        }

        let session = self.rotation.active_session().await?;
        let mut resolved = None;
        let mut driver_failure = true;
        for url in candidates {
            match self.resolver.resolve(url, &session).await {
                Ok(link) => {
                    resolved = Some(link);
                    break;
                }
                Err(e) => {
                    driver_failure &= e.is_driver();
                    warn!(source = %pair.source, url = %url, error = %e, "link generation failed");
                }
            }
        }
        let Some(link) = resolved else {
            error!(source = %pair.source, "no affiliate link generated, message not sent");
            return Ok(RelayOutcome::LinkGenerationFailed { driver_failure });
        };

        let mapping = [(link.original_url.clone(), link.affiliate_url.clone())];
        let text = replace_urls(&message.text, &mapping);
        // The canonical page carries the product id a short link hides.
        let identity: Vec<&str> = std::iter::once(link.canonical_url.as_str())
            .chain(urls.iter().map(String::as_str))
            .collect();

        if self.dedup.is_duplicate(&pair.destination, &text, &identity).await {
            let fingerprint = self.dedup.fingerprint(&text, &identity);
            info!(
                destination = %pair.destination,
                fingerprint = %fingerprint,
                "offer already sent recently, skipping"
            );
            return Ok(RelayOutcome::Duplicate { fingerprint });
        }

        let media = if message.has_media {
            self.acquire_media(&pair.source, &link.canonical_url).await
        } else {
            None
        };

        if !self.dispatch(&pair.destination, text.clone(), media).await {
            return Ok(RelayOutcome::DispatchFailed);
        }

        let fingerprint = match self.dedup.mark_sent(&pair.destination, &text, &identity).await {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                warn!(destination = %pair.destination, error = %e, "sent offer not recorded");
                self.dedup.fingerprint(&text, &identity)
            }
        };
        info!(
            source = %pair.source,
            destination = %pair.destination,
            fingerprint = %fingerprint,
            "offer forwarded"
        );
        Ok(RelayOutcome::Sent { fingerprint })
    }

    /// Race the product page against the source message for an image; if
    /// neither wins in time, give the source message one more direct try.
    async fn acquire_media(&self, source: &str, canonical_url: &str) -> Option<PathBuf> {
        let media = self.media.as_ref()?;
        let from_page = async {
            media
                .from_product_page(canonical_url)
                .await
                .inspect_err(|e| debug!(error = %e, "product page image failed"))
                .ok()
                .flatten()
        };
        let from_source = async {
            media
                .from_source_message(source)
                .await
                .inspect_err(|e| debug!(error = %e, "source message image failed"))
                .ok()
                .flatten()
        };
        if let Some(path) = first_success(from_page, from_source, self.media_timeout).await {
            return Some(path);
        }

        debug!(source, "media race produced nothing, capturing from source");
        match media.from_source_message(source).await {
            Ok(path) => path,
            Err(e) => {
                warn!(source, error = %e, "no image for offer");
                None
            }
        }
    }

    /// Deliver, falling back to text only when the offer with media fails.
    async fn dispatch(&self, destination: &str, text: String, media: Option<PathBuf>) -> bool {
        let with_media = media.is_some();
        let offer = OutboundOffer {
            destination: destination.to_string(),
            text,
            media,
        };
        let err = match self.dispatcher.dispatch(&offer).await {
            Ok(()) => return true,
            Err(e) => e,
        };
        if !with_media {
            error!(destination, error = %err, "dispatch failed");
            return false;
        }

        warn!(destination, error = %err, "dispatch with media failed, sending text only");
        let text_only = OutboundOffer {
            media: None,
            ..offer
        };
        match self.dispatcher.dispatch(&text_only).await {
            Ok(()) => true,
            Err(e) => {
                error!(destination, error = %e, "dispatch failed");
                false
            }
        }
    }

    async fn advance(&self, source: &str, fingerprint: &MessageFingerprint) {
        if let Err(e) = self.cursor.set(source, fingerprint).await {
            warn!(source, error = %e, "cursor not saved, message may be seen again");
        }
    }
}

/// Links of a message: its anchors, or whatever URLs its text contains.
fn message_urls(message: &SourceMessage) -> Vec<String> {
    let raw = if message.urls.is_empty() {
        extract_urls(&message.text)
    } else {
        message.urls.clone()
    };
    let mut urls: Vec<String> = Vec::with_capacity(raw.len());
    for url in raw {
        let url = url.trim().to_string();
        if !url.is_empty() && !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use linkrelay_accounts::TokenCache;
    use linkrelay_config::model::{AuthConfig, ResolverConfig};
    use linkrelay_core::AccountCredential;
    use linkrelay_extract::FingerprintPolicy;
    use linkrelay_test_utils::{
        ManualClock, MockDispatcher, MockDriver, MockLauncher, MockMedia, MockSource,
    };

    use super::*;

    const SHORT: &str = "https://x.example/sec/AB12";
    const PRODUCT: &str = "https://x.example/item/MLB999";

    struct Harness {
        relay: Relay,
        source: Arc<MockSource>,
        dispatcher: Arc<MockDispatcher>,
        cursor: Arc<CursorStore>,
        _dir: tempfile::TempDir,
    }

    fn driver() -> MockDriver {
        MockDriver::new()
            .with_route(SHORT, PRODUCT)
            .with_marker("csrf", "tok")
            .with_response(200, r#"{"id":"ZZ9"}"#)
    }

    fn harness(driver: MockDriver) -> Harness {
        let dir = tempfile::tempdir().unwrap();
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
                    max_retries: 1,
                    ..ResolverConfig::default()
                },
                "x-csrf-token",
                tokens,
            )
            .unwrap(),
        );
        let dedup = Arc::new(DedupCache::new(
            dir.path().join("dedup.txt"),
            Duration::from_secs(3 * 3600),
            FingerprintPolicy::default(),
            Arc::new(ManualClock::default()),
        ));
        let cursor = Arc::new(CursorStore::new(dir.path().join("cursor.txt")));
        let source = Arc::new(MockSource::new());
        let dispatcher = Arc::new(MockDispatcher::new());
        let relay = Relay::new(
            source.clone(),
            dispatcher.clone(),
            rotation,
            resolver,
            dedup,
            cursor.clone(),
            3,
            Duration::from_secs(8),
        );
        Harness {
            relay,
            source,
            dispatcher,
            cursor,
            _dir: dir,
        }
    }

    fn pair() -> ChannelPair {
        ChannelPair {
            source: "Deals".into(),
            destination: "Promo".into(),
            description: String::new(),
        }
    }

    fn offer_message() -> SourceMessage {
        SourceMessage {
            text: format!("Great deal {SHORT}"),
            urls: Vec::new(),
            has_media: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn new_message_is_rewritten_and_sent_once() {
        let h = harness(driver());
        h.source.post("Deals", offer_message()).await;

        let outcome = h.relay.process_pair(&pair()).await.unwrap();
        assert!(matches!(outcome, RelayOutcome::Sent { .. }));
        let sent = h.dispatcher.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, "Promo");
        assert_eq!(sent[0].text, "Great deal https://x.example/sec/ZZ9");
        assert!(h.cursor.get("Deals").await.is_some());

        let again = h.relay.process_pair(&pair()).await.unwrap();
        assert_eq!(again, RelayOutcome::Unchanged);
        assert_eq!(h.dispatcher.sent_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_dispatch_leaves_cursor_unchanged() {
        let h = harness(driver());
        let before = MessageFingerprint("previous".into());
        h.cursor.set("Deals", &before).await.unwrap();
        h.source.post("Deals", offer_message()).await;
        h.dispatcher.refuse(true);

        let outcome = h.relay.process_pair(&pair()).await.unwrap();
        assert_eq!(outcome, RelayOutcome::DispatchFailed);
        assert_eq!(h.cursor.get("Deals").await, Some(before));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_resolution_leaves_cursor_unchanged() {
        let h = harness(MockDriver::new().with_route(SHORT, "https://x.example/help"));
        h.source.post("Deals", offer_message()).await;

        let outcome = h.relay.process_pair(&pair()).await.unwrap();
        assert_eq!(
            outcome,
            RelayOutcome::LinkGenerationFailed {
                driver_failure: false
            }
        );
        assert_eq!(h.cursor.get("Deals").await, None);
        assert_eq!(h.dispatcher.sent_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn message_without_candidates_is_skipped_for_good() {
        let h = harness(driver());
        h.source
            .post(
                "Deals",
                SourceMessage {
                    text: "see https://blog.example/post".into(),
                    ..Default::default()
                },
            )
            .await;

        let outcome = h.relay.process_pair(&pair()).await.unwrap();
        assert_eq!(outcome, RelayOutcome::NoCandidateLinks);
        assert!(h.cursor.get("Deals").await.is_some());
        assert_eq!(h.dispatcher.sent_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_source_is_a_no_op() {
        let h = harness(driver());
        assert_eq!(
            h.relay.process_pair(&pair()).await.unwrap(),
            RelayOutcome::NoMessage
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_source_is_an_error() {
        let h = harness(driver());
        h.source.fail("Deals").await;
        let err = h.relay.process_pair(&pair()).await.unwrap_err();
        assert!(err.is_driver());
    }

    #[tokio::test(start_paused = true)]
    async fn media_race_winner_is_attached() {
        let mut h = harness(driver());
        let media = MockMedia {
            product_page: Some((Duration::from_secs(5), PathBuf::from("/tmp/page.jpg"))),
            source_message: Some((Duration::from_secs(1), PathBuf::from("/tmp/shot.jpg"))),
        };
        h.relay = h.relay.with_media(Arc::new(media));
        h.source
            .post(
                "Deals",
                SourceMessage {
                    has_media: true,
                    ..offer_message()
                },
            )
            .await;

        h.relay.process_pair(&pair()).await.unwrap();
        let sent = h.dispatcher.sent().await;
        assert_eq!(sent[0].media.as_deref(), Some(std::path::Path::new("/tmp/shot.jpg")));
    }

    #[test]
    fn anchors_win_over_text_and_are_deduplicated() {
        let message = SourceMessage {
            text: "text https://a.example/1".into(),
            urls: vec![
                "https://b.example/2".into(),
                " https://b.example/2 ".into(),
                "https://c.example/3".into(),
            ],
            has_media: false,
        };
        assert_eq!(
            message_urls(&message),
            vec!["https://b.example/2", "https://c.example/3"]
        );
    }
}
