// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Last-seen message fingerprint per source channel.
//!
//! Stored as `source|fingerprint` lines; the fingerprint never contains `|`,
//! so the split is taken from the right.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use linkrelay_core::{MessageFingerprint, RelayError};

use crate::record_file::RecordFile;

pub struct CursorStore {
    file: RecordFile,
    write_lock: Mutex<()>,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: RecordFile::new(path),
            write_lock: Mutex::new(()),
        }
    }

    /// Fingerprint last recorded for `source`.
    ///
    /// `None` when the source was never seen or the file cannot be read.
    pub async fn get(&self, source: &str) -> Option<MessageFingerprint> {
        match self.load().await {
            Ok(mut entries) => entries.remove(source).map(MessageFingerprint),
            Err(e) => {
                warn!(source, error = %e, "cursor file unreadable");
                None
            }
        }
    }

    /// Record `fingerprint` as the last message handled for `source`.
    pub async fn set(&self, source: &str, fingerprint: &MessageFingerprint) -> Result<(), RelayError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.get(source) == Some(&fingerprint.0) {
            return Ok(());
        }
        entries.insert(source.to_string(), fingerprint.0.clone());
        let lines = entries
            .iter()
            .map(|(source, fp)| format!("{source}|{fp}"))
            .collect();
        self.file.write_lines(lines).await?;
        debug!(source, fingerprint = %fingerprint, "cursor advanced");
        Ok(())
    }

    /// Every recorded cursor, ordered by source.
    pub async fn entries(&self) -> Result<Vec<(String, MessageFingerprint)>, RelayError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .map(|(source, fp)| (source, MessageFingerprint(fp)))
            .collect())
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, RelayError> {
        let mut entries = BTreeMap::new();
        for line in self.file.read_lines().await? {
            match line.rsplit_once('|') {
                Some((source, fp)) if !source.is_empty() && !fp.trim().is_empty() => {
                    entries.insert(source.to_string(), fp.trim().to_string());
                }
                _ => debug!(line, "skipping malformed cursor entry"),
            }
        }
        Ok(entries)
    }
}
