// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linkrelay check` command implementation.
//!
//! Runs quick diagnostics against the loaded configuration: channel pairs,
//! accounts, state files and session profiles.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use linkrelay_config::RelayConfig;
use linkrelay_core::RelayError;
use linkrelay_storage::RecordFile;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, started: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: started.elapsed(),
        }
    }
}

/// Run the `linkrelay check` command. With `plain`, disables colored output.
pub async fn run_check(config: &RelayConfig, plain: bool) -> Result<(), RelayError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config).await;

    println!();
    println!("  linkrelay check ({})", config.relay.name);
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", render_line(result, use_color));
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

async fn collect_checks(config: &RelayConfig) -> Vec<CheckResult> {
    let mut results = vec![check_pairs(config), check_accounts(config)];
    results.push(check_state_file("dedup cache", &config.dedup.cache_path).await);
    results.push(check_state_file("cursor store", &config.cursor.path).await);
    results.extend(check_profiles(config).await);
    results
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!("    {symbol} {:<20} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

fn check_pairs(config: &RelayConfig) -> CheckResult {
    let start = Instant::now();
    match config.pairs.len() {
        0 => CheckResult::new("pairs", CheckStatus::Warn, "no channel pairs configured", start),
        n => CheckResult::new("pairs", CheckStatus::Pass, format!("{n} configured"), start),
    }
}

fn check_accounts(config: &RelayConfig) -> CheckResult {
    let start = Instant::now();
    let accounts = &config.accounts.profiles;
    if accounts.is_empty() {
        return CheckResult::new("accounts", CheckStatus::Fail, "no accounts configured", start);
    }
    let isolated = accounts.iter().filter(|a| !a.uses_shared_session).count();
    CheckResult::new(
        "accounts",
        CheckStatus::Pass,
        format!(
            "{} configured ({isolated} isolated), rotating every {} min",
            accounts.len(),
            config.accounts.rotation_minutes
        ),
        start,
    )
}

async fn check_state_file(name: &str, path: &str) -> CheckResult {
    let start = Instant::now();
    match RecordFile::new(path).read_lines().await {
        Ok(lines) if lines.is_empty() && !Path::new(path).exists() => CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{path} (not created yet)"),
            start,
        ),
        Ok(lines) => CheckResult::new(
            name,
            CheckStatus::Pass,
            format!("{path} ({} entries)", lines.len()),
            start,
        ),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_profiles(config: &RelayConfig) -> Vec<CheckResult> {
    let mut results = Vec::new();
    let uses_shared = config.accounts.profiles.iter().any(|a| a.uses_shared_session);

    if uses_shared {
        let start = Instant::now();
        let shared = config.accounts.shared_profile.trim();
        results.push(if shared.is_empty() {
            CheckResult::new(
                "shared profile",
                CheckStatus::Warn,
                "not set, shared session starts without cookies",
                start,
            )
        } else {
            profile_result("shared profile", shared, start).await
        });
    }

    for account in config.accounts.profiles.iter().filter(|a| !a.uses_shared_session) {
        let start = Instant::now();
        let name = format!("profile {}", account.name);
        let profile = account.session_profile.trim();
        results.push(if profile.is_empty() {
            CheckResult::new(&name, CheckStatus::Fail, "isolated account has no profile", start)
        } else {
            profile_result(&name, profile, start).await
        });
    }
    results
}

async fn profile_result(name: &str, path: &str, start: Instant) -> CheckResult {
    match tokio::fs::read_to_string(path).await {
        Ok(cookie) if cookie.trim().is_empty() => {
            CheckResult::new(name, CheckStatus::Warn, format!("{path} is empty"), start)
        }
        Ok(_) => CheckResult::new(name, CheckStatus::Pass, path, start),
        Err(e) => CheckResult::new(name, CheckStatus::Fail, format!("{path}: {e}"), start),
    }
}
