// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock message source, dispatcher and media provider.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use linkrelay_core::{
    Dispatcher, MediaProvider, MessageSource, OutboundOffer, RelayError, SourceMessage,
};

/// Source channels whose latest message is set by the test.
#[derive(Default)]
pub struct MockSource {
    latest: Mutex<HashMap<String, SourceMessage>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `message` the latest one in `source`.
    pub async fn post(&self, source: &str, message: SourceMessage) {
        self.latest.lock().await.insert(source.to_string(), message);
    }

    /// Reading `source` fails with a driver error.
    pub async fn fail(&self, source: &str) {
        self.failing.lock().await.insert(source.to_string());
    }

    /// Every read sleeps for `delay` first.
    pub async fn slow_down(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }
}

#[async_trait]
impl MessageSource for MockSource {
    async fn latest_message(&self, source: &str) -> Result<Option<SourceMessage>, RelayError> {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().await.contains(source) {
            return Err(RelayError::driver(format!("could not read {source}")));
        }
        Ok(self.latest.lock().await.get(source).cloned())
    }
}

/// Captures dispatched offers; can be told to refuse them.
#[derive(Default)]
pub struct MockDispatcher {
    sent: Mutex<Vec<OutboundOffer>>,
    refuse: AtomicBool,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<OutboundOffer> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn dispatch(&self, offer: &OutboundOffer) -> Result<(), RelayError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(RelayError::Dispatch {
                destination: offer.destination.clone(),
                message: "destination unavailable".into(),
            });
        }
        self.sent.lock().await.push(offer.clone());
        Ok(())
    }
}

/// Media lookups answering after a fixed delay.
#[derive(Debug, Clone, Default)]
pub struct MockMedia {
    pub product_page: Option<(Duration, PathBuf)>,
    pub source_message: Option<(Duration, PathBuf)>,
}

async fn after(scripted: Option<(Duration, PathBuf)>) -> Option<PathBuf> {
    let (delay, path) = scripted?;
    tokio::time::sleep(delay).await;
    Some(path)
}

#[async_trait]
impl MediaProvider for MockMedia {
    async fn from_product_page(&self, _canonical_url: &str) -> Result<Option<PathBuf>, RelayError> {
        Ok(after(self.product_page.clone()).await)
    }

    async fn from_source_message(&self, _source: &str) -> Result<Option<PathBuf>, RelayError> {
        Ok(after(self.source_message.clone()).await)
    }
}
