// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the linkrelay affiliate relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use linkrelay_core::{AccountCredential, FingerprintSource};
use serde::{Deserialize, Serialize};

/// Top-level linkrelay configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Process-wide relay behavior.
    #[serde(default)]
    pub relay: RelaySection,

    /// Source → destination channel pairs, checked in order each cycle.
    #[serde(default)]
    pub pairs: Vec<ChannelPair>,

    /// Credentialed accounts and their rotation schedule.
    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Authorization surface the session token is read from.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Link resolution protocol settings.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Content deduplication cache.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Per-source cursor store.
    #[serde(default)]
    pub cursor: CursorConfig,

    /// Polling cycle pacing and timeouts.
    #[serde(default)]
    pub poll: PollConfig,
}

/// Relay identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Display name used in log lines.
    #[serde(default = "default_relay_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How many candidate links of a message are tried before giving up.
    #[serde(default = "default_max_links")]
    pub max_links_per_message: usize,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            name: default_relay_name(),
            log_level: default_log_level(),
            max_links_per_message: default_max_links(),
        }
    }
}

fn default_relay_name() -> String {
    "linkrelay".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_links() -> usize {
    3
}

/// A source channel whose offers are forwarded to a destination channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelPair {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub description: String,
}

impl ChannelPair {
    /// Human label for logs: the description, or `source -> destination`.
    pub fn label(&self) -> String {
        if self.description.trim().is_empty() {
            format!("{} -> {}", self.source, self.destination)
        } else {
            self.description.clone()
        }
    }
}

/// Account pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    /// Minutes an account stays active before the next one takes over.
    #[serde(default = "default_rotation_minutes")]
    pub rotation_minutes: u64,

    /// Cookie profile of the primary session that shared accounts ride on.
    #[serde(default)]
    pub shared_profile: String,

    /// Ordered account list; rotation walks it circularly.
    #[serde(default)]
    pub profiles: Vec<AccountCredential>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            rotation_minutes: default_rotation_minutes(),
            shared_profile: String::new(),
            profiles: Vec::new(),
        }
    }
}

impl AccountsConfig {
    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_minutes.saturating_mul(60))
    }
}

fn default_rotation_minutes() -> u64 {
    30
}

/// Where and how the per-account session token is obtained.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Page that embeds the token marker.
    #[serde(default = "default_auth_url")]
    pub url: String,

    /// Marker hints handed to the driver, tried in order.
    #[serde(default = "default_token_markers")]
    pub token_markers: Vec<String>,

    /// Header the token is sent in when creating links.
    #[serde(default = "default_token_header")]
    pub token_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: default_auth_url(),
            token_markers: default_token_markers(),
            token_header: default_token_header(),
        }
    }
}

fn default_auth_url() -> String {
    "https://www.mercadolivre.com.br/afiliados".to_string()
}

fn default_token_markers() -> Vec<String> {
    vec!["csrf-token".to_string(), "_csrf".to_string()]
}

fn default_token_header() -> String {
    "x-csrf-token".to_string()
}

/// Link resolution protocol configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Link-creation endpoint called with the canonical URL and the tag.
    #[serde(default = "default_create_link_url")]
    pub create_link_url: String,

    /// Total attempts per link, the first one included.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed pause between attempts.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Upper bound on interstitial "go to product" actions per attempt.
    #[serde(default = "default_interstitial_steps")]
    pub interstitial_steps: u32,

    /// Action hints used to leave an interstitial page.
    #[serde(default = "default_advance_actions")]
    pub advance_actions: Vec<String>,

    /// Regex a canonical product URL must match.
    #[serde(default = "default_product_marker")]
    pub product_marker: String,

    /// Path segment identifying generated short links.
    #[serde(default = "default_short_link_path")]
    pub short_link_path: String,

    /// Hosts whose links are tracked by rewriting a query tag instead of
    /// calling the link-creation endpoint.
    #[serde(default = "default_tag_rewrite_hosts")]
    pub tag_rewrite_hosts: Vec<String>,

    /// Page markers carrying a product id when the URL has none.
    #[serde(default = "default_product_id_markers")]
    pub product_id_markers: Vec<String>,

    /// Per-request timeout for the HTTP driver.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            create_link_url: default_create_link_url(),
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
            interstitial_steps: default_interstitial_steps(),
            advance_actions: default_advance_actions(),
            product_marker: default_product_marker(),
            short_link_path: default_short_link_path(),
            tag_rewrite_hosts: default_tag_rewrite_hosts(),
            product_id_markers: default_product_id_markers(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ResolverConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_create_link_url() -> String {
    "https://www.mercadolivre.com.br/affiliate-program/api/v2/affiliates/createLink".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_secs() -> u64 {
    3
}

fn default_interstitial_steps() -> u32 {
    6
}

fn default_advance_actions() -> Vec<String> {
    vec!["Ir para produto".to_string()]
}

fn default_product_marker() -> String {
    r"(?i)MLB-?\d+".to_string()
}

fn default_short_link_path() -> String {
    "/sec/".to_string()
}

fn default_tag_rewrite_hosts() -> Vec<String> {
    vec![
        "amazon.com".to_string(),
        "amazon.com.br".to_string(),
        "amzn.to".to_string(),
    ]
}

fn default_product_id_markers() -> Vec<String> {
    vec!["data-asin".to_string(), "ASIN".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Content deduplication cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// Path of the `destination|fingerprint|timestamp` record file.
    #[serde(default = "default_dedup_path")]
    pub cache_path: String,

    /// Cooldown during which the same offer is not re-sent to a destination.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,

    /// Fingerprint derivation order; raw text is always the last resort.
    #[serde(default = "default_fingerprint_order")]
    pub fingerprint_order: Vec<FingerprintSource>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            cache_path: default_dedup_path(),
            window_minutes: default_window_minutes(),
            fingerprint_order: default_fingerprint_order(),
        }
    }
}

impl DedupConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_minutes.saturating_mul(60))
    }
}

fn default_dedup_path() -> String {
    "dedup_cache.txt".to_string()
}

fn default_window_minutes() -> u64 {
    180
}

fn default_fingerprint_order() -> Vec<FingerprintSource> {
    vec![
        FingerprintSource::ProductId,
        FingerprintSource::UrlSet,
        FingerprintSource::Text,
    ]
}

/// Source cursor store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CursorConfig {
    /// Path of the `source|fingerprint` record file.
    #[serde(default = "default_cursor_path")]
    pub path: String,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            path: default_cursor_path(),
        }
    }
}

fn default_cursor_path() -> String {
    "state_last_seen.txt".to_string()
}

/// Polling cycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// Pause after a full sweep over every pair.
    #[serde(default = "default_cycle_pause_secs")]
    pub cycle_pause_secs: u64,

    /// Pause between two sources within a sweep.
    #[serde(default = "default_inter_source_pause_ms")]
    pub inter_source_pause_ms: u64,

    /// Upper bound on a whole sweep; exceeding it requests a restart.
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,

    /// How long the two media strategies may race.
    #[serde(default = "default_media_race_timeout_secs")]
    pub media_race_timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            cycle_pause_secs: default_cycle_pause_secs(),
            inter_source_pause_ms: default_inter_source_pause_ms(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            media_race_timeout_secs: default_media_race_timeout_secs(),
        }
    }
}

impl PollConfig {
    pub fn cycle_pause(&self) -> Duration {
        Duration::from_secs(self.cycle_pause_secs)
    }

    pub fn inter_source_pause(&self) -> Duration {
        Duration::from_millis(self.inter_source_pause_ms)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    pub fn media_race_timeout(&self) -> Duration {
        Duration::from_secs(self.media_race_timeout_secs)
    }
}

fn default_cycle_pause_secs() -> u64 {
    180
}

fn default_inter_source_pause_ms() -> u64 {
    300
}

fn default_cycle_timeout_secs() -> u64 {
    600
}

fn default_media_race_timeout_secs() -> u64 {
    8
}
