// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./linkrelay.toml` > `~/.config/linkrelay/linkrelay.toml`
//! > `/etc/linkrelay/linkrelay.toml` with environment variable overrides via the
//! `LINKRELAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use tracing::debug;

use crate::model::RelayConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/linkrelay/linkrelay.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "linkrelay.toml";

/// Sections whose keys may be overridden through `LINKRELAY_<SECTION>_<KEY>`.
const ENV_SECTIONS: &[&str] = &[
    "relay", "accounts", "auth", "resolver", "dedup", "cursor", "poll",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/linkrelay/linkrelay.toml` (system-wide)
/// 3. `~/.config/linkrelay/linkrelay.toml` (user XDG config)
/// 4. `./linkrelay.toml` (local directory)
/// 5. `LINKRELAY_*` environment variables
pub fn load_config() -> Result<RelayConfig, figment::Error> {
    let present: Vec<PathBuf> = config_layers()
        .into_iter()
        .filter(|path| path.is_file())
        .collect();
    debug!(files = ?present, "merging config layers");
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<RelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RelayConfig, figment::Error> {
    debug!(file = %path.display(), "loading explicit config file");
    Figment::new()
        .merge(Serialized::defaults(RelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    config_layers()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(RelayConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Candidate config files, lowest precedence first. Missing files are skipped
/// by the merge.
pub fn config_layers() -> Vec<PathBuf> {
    let mut layers = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    layers.extend(user_config_path());
    layers.push(PathBuf::from(LOCAL_CONFIG_FILE));
    layers
}

/// `~/.config/linkrelay/linkrelay.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("linkrelay").join(LOCAL_CONFIG_FILE))
}

/// Create the environment variable provider with explicit section mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `LINKRELAY_DEDUP_WINDOW_MINUTES` maps to `dedup.window_minutes`, not
/// `dedup.window.minutes`.
fn env_provider() -> Env {
    Env::prefixed("LINKRELAY_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("dedup_window_minutes"), "dedup.window_minutes");
        assert_eq!(map_env_key("auth_token_header"), "auth.token_header");
        assert_eq!(map_env_key("relay_log_level"), "relay.log_level");
    }

    #[test]
    fn layers_run_from_system_to_local() {
        let layers = config_layers();
        assert_eq!(layers.first(), Some(&PathBuf::from(SYSTEM_CONFIG_PATH)));
        assert_eq!(layers.last(), Some(&PathBuf::from(LOCAL_CONFIG_FILE)));
    }

    #[test]
    fn unknown_prefix_is_left_alone() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }
}
