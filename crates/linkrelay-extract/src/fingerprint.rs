// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content and message fingerprints.

use std::collections::BTreeSet;

use linkrelay_core::{ContentFingerprint, FingerprintSource, MessageFingerprint};
use sha2::{Digest, Sha256};

use crate::product;

/// Hex characters kept from the content digest.
const CONTENT_FINGERPRINT_LEN: usize = 32;

/// Which inputs identify an offer, in priority order.
///
/// Whatever the configured order, raw text is used when nothing else applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintPolicy {
    order: Vec<FingerprintSource>,
}

impl FingerprintPolicy {
    pub fn new(order: Vec<FingerprintSource>) -> Self {
        Self { order }
    }

    pub fn order(&self) -> &[FingerprintSource] {
        &self.order
    }
}

impl Default for FingerprintPolicy {
    fn default() -> Self {
        Self::new(vec![
            FingerprintSource::ProductId,
            FingerprintSource::UrlSet,
            FingerprintSource::Text,
        ])
    }
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// The string a content fingerprint is computed from.
pub fn identity_basis<S: AsRef<str>>(text: &str, urls: &[S], policy: &FingerprintPolicy) -> String {
    policy
        .order
        .iter()
        .find_map(|source| match source {
            FingerprintSource::ProductId => product::extract(urls).map(|r| r.key()),
            FingerprintSource::UrlSet => {
                let set: BTreeSet<&str> = urls
                    .iter()
                    .map(|u| u.as_ref().trim())
                    .filter(|u| !u.is_empty())
                    .collect();
                (!set.is_empty()).then(|| set.into_iter().collect::<Vec<_>>().join("|"))
            }
            FingerprintSource::Text => Some(text.trim().to_string()),
        })
        .unwrap_or_else(|| text.trim().to_string())
}

/// Identity of an offer for deduplication: two messages promoting the same
/// product map to the same value even when their links differ.
pub fn content_fingerprint<S: AsRef<str>>(
    text: &str,
    urls: &[S],
    policy: &FingerprintPolicy,
) -> ContentFingerprint {
    let mut digest = sha256_hex(&identity_basis(text, urls, policy));
    digest.truncate(CONTENT_FINGERPRINT_LEN);
    ContentFingerprint(digest)
}

/// Change-detection digest of a source message.
pub fn message_fingerprint<S: AsRef<str>>(text: &str, urls: &[S]) -> MessageFingerprint {
    let joined = urls.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("|");
    MessageFingerprint(sha256_hex(&format!("{text}||{joined}")))
}
