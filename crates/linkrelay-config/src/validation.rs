// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers what serde attributes cannot express: parseable URLs, compilable
//! patterns, unique account names, non-zero windows.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::RelayConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.relay.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "relay.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.relay.log_level
        )));
    }
    if config.relay.max_links_per_message == 0 {
        errors.push(ConfigError::validation(
            "relay.max_links_per_message must be at least 1",
        ));
    }

    let mut seen_sources = HashSet::new();
    for (i, pair) in config.pairs.iter().enumerate() {
        if pair.source.trim().is_empty() || pair.destination.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "pairs[{i}] needs both a source and a destination"
            )));
        }
        if pair.source.contains('|') {
            errors.push(ConfigError::validation(format!(
                "pairs[{i}].source `{}` must not contain `|`",
                pair.source
            )));
        }
        if pair.destination.contains('|') {
            errors.push(ConfigError::validation(format!(
                "pairs[{i}].destination `{}` must not contain `|`",
                pair.destination
            )));
        }
        if !seen_sources.insert(pair.source.as_str()) {
            errors.push(ConfigError::validation(format!(
                "pairs[{i}].source `{}` is listed more than once",
                pair.source
            )));
        }
    }

    if config.accounts.rotation_minutes == 0 {
        errors.push(ConfigError::validation(
            "accounts.rotation_minutes must be at least 1",
        ));
    }
    let mut seen_accounts = HashSet::new();
    for account in &config.accounts.profiles {
        if account.name.trim().is_empty() {
            errors.push(ConfigError::validation("accounts.profiles entries need a name"));
        } else if !seen_accounts.insert(account.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate account name `{}`",
                account.name
            )));
        }
        if account.affiliate_tag.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "account `{}` has an empty affiliate_tag",
                account.name
            )));
        }
    }

    check_url(&mut errors, "auth.url", &config.auth.url);
    if config.auth.token_markers.is_empty() {
        errors.push(ConfigError::validation(
            "auth.token_markers must list at least one marker",
        ));
    }
    if config.auth.token_header.trim().is_empty() {
        errors.push(ConfigError::validation("auth.token_header must not be empty"));
    }

    check_url(
        &mut errors,
        "resolver.create_link_url",
        &config.resolver.create_link_url,
    );
    if config.resolver.max_retries == 0 {
        errors.push(ConfigError::validation(
            "resolver.max_retries counts total attempts and must be at least 1",
        ));
    }
    if let Err(e) = regex::Regex::new(&config.resolver.product_marker) {
        errors.push(ConfigError::validation(format!(
            "resolver.product_marker is not a valid pattern: {e}"
        )));
    }
    if config.resolver.short_link_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "resolver.short_link_path must not be empty",
        ));
    }
    if config.resolver.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "resolver.request_timeout_secs must be at least 1",
        ));
    }

    if config.dedup.cache_path.trim().is_empty() {
        errors.push(ConfigError::validation("dedup.cache_path must not be empty"));
    }
    if config.dedup.window_minutes == 0 {
        errors.push(ConfigError::validation(
            "dedup.window_minutes must be at least 1",
        ));
    }
    if config.cursor.path.trim().is_empty() {
        errors.push(ConfigError::validation("cursor.path must not be empty"));
    }
    if !config.dedup.cache_path.trim().is_empty() && config.dedup.cache_path == config.cursor.path
    {
        errors.push(ConfigError::validation(
            "dedup.cache_path and cursor.path must be different files",
        ));
    }

    if config.poll.cycle_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "poll.cycle_timeout_secs must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => errors.push(ConfigError::validation(format!(
            "{key} must be an http(s) URL, got scheme `{}`",
            parsed.scheme()
        ))),
        Err(e) => errors.push(ConfigError::validation(format!(
            "{key} `{value}` is not a valid URL: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkrelay_core::AccountCredential;

    fn account(name: &str, tag: &str) -> AccountCredential {
        AccountCredential {
            name: name.to_string(),
            session_profile: String::new(),
            affiliate_tag: tag.to_string(),
            uses_shared_session: false,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn duplicate_account_names_are_rejected() {
        let mut config = RelayConfig::default();
        config.accounts.profiles = vec![account("main", "t1"), account("main", "t2")];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("duplicate account name"));
    }

    #[test]
    fn zero_attempts_and_bad_pattern_both_reported() {
        let mut config = RelayConfig::default();
        config.resolver.max_retries = 0;
        config.resolver.product_marker = "(unclosed".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn separator_in_channel_name_is_rejected() {
        let mut config = RelayConfig::default();
        config.pairs.push(crate::model::ChannelPair {
            source: "deals|br".to_string(),
            destination: "out".to_string(),
            description: String::new(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("must not contain `|`"));
    }

    #[test]
    fn non_http_endpoint_is_rejected() {
        let mut config = RelayConfig::default();
        config.resolver.create_link_url = "ftp://example.com/create".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("http(s)"));
    }
}
