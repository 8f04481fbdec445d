// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linkrelay fingerprint`, `linkrelay dedup` and `linkrelay cursor`.

use std::sync::Arc;

use linkrelay_config::RelayConfig;
use linkrelay_core::{MessageFingerprint, RelayError, SystemClock};
use linkrelay_extract::FingerprintPolicy;
use linkrelay_extract::fingerprint::identity_basis;
use linkrelay_storage::{CursorStore, DedupCache};

fn policy(config: &RelayConfig) -> FingerprintPolicy {
    FingerprintPolicy::new(config.dedup.fingerprint_order.clone())
}

fn dedup_cache(config: &RelayConfig) -> DedupCache {
    DedupCache::new(
        &config.dedup.cache_path,
        config.dedup.window(),
        policy(config),
        Arc::new(SystemClock),
    )
}

fn cursor_store(config: &RelayConfig) -> CursorStore {
    CursorStore::new(&config.cursor.path)
}

/// Unix seconds as an RFC 3339 UTC timestamp.
fn format_timestamp(unix_secs: f64) -> String {
    chrono::DateTime::from_timestamp(unix_secs.floor() as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| format!("{unix_secs}"))
}

pub fn print_fingerprint(config: &RelayConfig, text: &str, urls: &[String]) {
    let policy = policy(config);
    let fingerprint = linkrelay_extract::content_fingerprint(text, urls, &policy);
    println!("{fingerprint}");
    println!("basis: {}", identity_basis(text, urls, &policy));
}

pub async fn dedup_check(
    config: &RelayConfig,
    destination: &str,
    text: &str,
    urls: &[String],
) -> Result<(), RelayError> {
    let cache = dedup_cache(config);
    let fingerprint = cache.fingerprint(text, urls);
    let duplicate = cache.is_duplicate(destination, text, urls).await;

    println!("fingerprint: {fingerprint}");
    match cache.last_sent(destination, &fingerprint).await? {
        Some(sent_at) => println!("last sent:   {}", format_timestamp(sent_at)),
        None => println!("last sent:   never"),
    }
    println!("duplicate:   {}", if duplicate { "yes" } else { "no" });
    Ok(())
}

pub async fn dedup_mark(
    config: &RelayConfig,
    destination: &str,
    text: &str,
    urls: &[String],
) -> Result<(), RelayError> {
    let fingerprint = dedup_cache(config)
        .mark_sent(destination, text, urls)
        .await?;
    println!("marked {fingerprint} as sent to {destination}");
    Ok(())
}

pub async fn dedup_prune(config: &RelayConfig) -> Result<(), RelayError> {
    let dropped = dedup_cache(config).prune().await?;
    println!("pruned {dropped} expired entries");
    Ok(())
}

pub async fn cursor_get(config: &RelayConfig, source: &str) -> Result<(), RelayError> {
    match cursor_store(config).get(source).await {
        Some(fingerprint) => println!("{fingerprint}"),
        None => println!("(none)"),
    }
    Ok(())
}

pub async fn cursor_set(
    config: &RelayConfig,
    source: &str,
    fingerprint: &str,
) -> Result<(), RelayError> {
    let fingerprint = fingerprint.trim();
    if fingerprint.is_empty() || fingerprint.contains('|') {
        return Err(RelayError::Config(
            "fingerprint must be non-empty and must not contain '|'".into(),
        ));
    }
    cursor_store(config)
        .set(source, &MessageFingerprint(fingerprint.to_string()))
        .await?;
    println!("cursor for {source} set to {fingerprint}");
    Ok(())
}

pub async fn cursor_list(config: &RelayConfig) -> Result<(), RelayError> {
    let entries = cursor_store(config).entries().await?;
    if entries.is_empty() {
        println!("(no cursors)");
    }
    for (source, fingerprint) in entries {
        println!("{source}\t{fingerprint}");
    }
    Ok(())
}
