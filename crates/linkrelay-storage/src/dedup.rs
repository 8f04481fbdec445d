// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-destination content deduplication within a cooldown window.
//!
//! Backing file format, one entry per line:
//!
//! ```text
//! destination|fingerprint|unix_timestamp
//! ```
//!
//! Lines are split from the right, so destination names may contain `|`.
//! The file is re-read on every call; the store keeps no cache of its own.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use linkrelay_core::{Clock, ContentFingerprint, RelayError};
use linkrelay_extract::{FingerprintPolicy, content_fingerprint};

use crate::record_file::RecordFile;

type Entries = BTreeMap<(String, String), f64>;

pub struct DedupCache {
    file: RecordFile,
    window: Duration,
    policy: FingerprintPolicy,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl DedupCache {
    pub fn new(
        path: impl Into<PathBuf>,
        window: Duration,
        policy: FingerprintPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            file: RecordFile::new(path),
            window,
            policy,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn fingerprint<S: AsRef<str>>(&self, text: &str, urls: &[S]) -> ContentFingerprint {
        content_fingerprint(text, urls, &self.policy)
    }

    /// Whether this content went to `destination` within the window.
    ///
    /// An unreadable backing file counts as "not a duplicate".
    pub async fn is_duplicate<S: AsRef<str>>(
        &self,
        destination: &str,
        text: &str,
        urls: &[S],
    ) -> bool {
        let fingerprint = self.fingerprint(text, urls);
        match self.last_sent(destination, &fingerprint).await {
            Ok(Some(sent_at)) => self.clock.unix_now() - sent_at < self.window.as_secs_f64(),
            Ok(None) => false,
            Err(e) => {
                warn!(destination, error = %e, "dedup cache unreadable, treating as new");
                false
            }
        }
    }

    /// Record that this content was just sent to `destination`, then drop
    /// every expired entry.
    ///
    /// Refuses to write when the existing file cannot be read, rather than
    /// replacing it with a partial view.
    pub async fn mark_sent<S: AsRef<str>>(
        &self,
        destination: &str,
        text: &str,
        urls: &[S],
    ) -> Result<ContentFingerprint, RelayError> {
        let fingerprint = self.fingerprint(text, urls);
        let _guard = self.write_lock.lock().await;

        let mut entries = self.load().await?;
        let now = self.clock.unix_now();
        entries.insert((destination.to_string(), fingerprint.0.clone()), now);
        let dropped = self.expire(&mut entries, now);
        self.save(&entries).await?;

        debug!(destination, fingerprint = %fingerprint, dropped, "offer marked as sent");
        Ok(fingerprint)
    }

    /// Drop expired entries for every destination. Returns how many went.
    pub async fn prune(&self) -> Result<usize, RelayError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        let dropped = self.expire(&mut entries, self.clock.unix_now());
        if dropped > 0 {
            self.save(&entries).await?;
            info!(dropped, "expired dedup entries pruned");
        }
        Ok(dropped)
    }

    /// When `fingerprint` was last sent to `destination`, expired or not.
    pub async fn last_sent(
        &self,
        destination: &str,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<f64>, RelayError> {
        let entries = self.load().await?;
        Ok(entries
            .get(&(destination.to_string(), fingerprint.0.clone()))
            .copied())
    }

    fn expire(&self, entries: &mut Entries, now: f64) -> usize {
        let window = self.window.as_secs_f64();
        let before = entries.len();
        entries.retain(|_, sent_at| now - *sent_at < window);
        before - entries.len()
    }

    async fn load(&self) -> Result<Entries, RelayError> {
        let mut entries = Entries::new();
        for line in self.file.read_lines().await? {
            match parse_line(&line) {
                Some((destination, fingerprint, sent_at)) => {
                    entries.insert((destination.to_string(), fingerprint.to_string()), sent_at);
                }
                None => debug!(line, "skipping malformed dedup entry"),
            }
        }
        Ok(entries)
    }

    async fn save(&self, entries: &Entries) -> Result<(), RelayError> {
        let lines = entries
            .iter()
            .map(|((destination, fingerprint), sent_at)| {
                format!("{destination}|{fingerprint}|{sent_at}")
            })
            .collect();
        self.file.write_lines(lines).await
    }
}

fn parse_line(line: &str) -> Option<(&str, &str, f64)> {
    let mut parts = line.rsplitn(3, '|');
    let sent_at = parts.next()?.trim().parse::<f64>().ok()?;
    let fingerprint = parts.next()?.trim();
    let destination = parts.next()?;
    if fingerprint.is_empty() || destination.is_empty() || !sent_at.is_finite() {
        return None;
    }
    Some((destination, fingerprint, sent_at))
}

#[cfg(test)]
mod tests {
    use linkrelay_test_utils::ManualClock;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(3 * 60 * 60);

    fn cache(path: PathBuf, clock: Arc<ManualClock>) -> DedupCache {
        DedupCache::new(path, WINDOW, FingerprintPolicy::default(), clock)
    }

    #[tokio::test]
    async fn marked_content_is_duplicate_for_same_destination_only() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(dir.path().join("dedup.txt"), clock.clone());
        let urls = ["https://x.example/item/MLB999"];

        assert!(!cache.is_duplicate("Promo", "deal", &urls).await);
        cache.mark_sent("Promo", "deal", &urls).await.unwrap();

        clock.advance(Duration::from_secs(10 * 60));
        assert!(cache.is_duplicate("Promo", "other wording", &urls).await);
        assert!(!cache.is_duplicate("Other", "deal", &urls).await);
    }

    #[tokio::test]
    async fn entries_expire_after_window() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(dir.path().join("dedup.txt"), clock.clone());
        let urls = ["https://a.example/1"];

        cache.mark_sent("Promo", "t", &urls).await.unwrap();
        clock.advance(WINDOW - Duration::from_secs(1));
        assert!(cache.is_duplicate("Promo", "t", &urls).await);
        clock.advance(Duration::from_secs(1));
        assert!(!cache.is_duplicate("Promo", "t", &urls).await);
    }

    #[tokio::test]
    async fn marking_prunes_every_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup.txt");
        let clock = Arc::new(ManualClock::default());
        let cache = cache(path.clone(), clock.clone());

        cache.mark_sent("A", "old", &["https://a.example/1"]).await.unwrap();
        clock.advance(WINDOW);
        cache.mark_sent("B", "new", &["https://b.example/2"]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("B|"));
    }

    #[tokio::test]
    async fn destinations_may_contain_separator() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(dir.path().join("dedup.txt"), clock);
        let urls = ["https://a.example/1"];

        cache.mark_sent("Promo | BR", "t", &urls).await.unwrap();
        assert!(cache.is_duplicate("Promo | BR", "t", &urls).await);
    }

    #[tokio::test]
    async fn malformed_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup.txt");
        std::fs::write(&path, "garbage\nPromo|abc|not-a-number\n|fp|1.0\n").unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(path.clone(), clock);

        cache.mark_sent("Promo", "t", &["https://a.example/1"]).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn unreadable_file_is_not_duplicate_and_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        // A directory cannot be read as a file.
        let cache = cache(dir.path().to_path_buf(), clock);
        let urls = ["https://a.example/1"];

        assert!(!cache.is_duplicate("Promo", "t", &urls).await);
        assert!(logs_contain("dedup cache unreadable"));
        assert!(matches!(
            cache.mark_sent("Promo", "t", &urls).await,
            Err(RelayError::Persistence { .. })
        ));
    }

    #[tokio::test]
    async fn prune_reports_dropped_entries() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = cache(dir.path().join("dedup.txt"), clock.clone());

        cache.mark_sent("A", "1", &["https://a.example/1"]).await.unwrap();
        cache.mark_sent("A", "2", &["https://a.example/2"]).await.unwrap();
        assert_eq!(cache.prune().await.unwrap(), 0);
        clock.advance(WINDOW);
        assert_eq!(cache.prune().await.unwrap(), 2);
    }

    #[test]
    fn line_parsing_splits_from_the_right() {
        assert_eq!(
            parse_line("a|b|fp|12.5"),
            Some(("a|b", "fp", 12.5))
        );
        assert_eq!(parse_line("fp|12"), None);
    }
}
