// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linkrelay resolve` and `linkrelay rotate`.

use std::sync::Arc;

use linkrelay_accounts::{RotationManager, TokenCache};
use linkrelay_config::RelayConfig;
use linkrelay_core::RelayError;
use linkrelay_http::{HttpDriver, HttpLauncher};
use linkrelay_resolver::LinkResolver;
use tracing::info;

/// Primary session, loaded with the shared profile's cookie when one is set.
async fn primary_driver(config: &RelayConfig) -> Result<HttpDriver, RelayError> {
    let timeout = config.resolver.request_timeout();
    let profile = config.accounts.shared_profile.trim();
    if profile.is_empty() {
        return HttpDriver::new(timeout, None);
    }
    let cookie = tokio::fs::read_to_string(profile)
        .await
        .map_err(|e| RelayError::Session {
            account: "shared".into(),
            message: format!("cannot read shared profile {profile}: {e}"),
        })?;
    HttpDriver::new(timeout, Some(&cookie))
}

async fn rotation_manager(
    config: &RelayConfig,
    tokens: Arc<TokenCache>,
) -> Result<RotationManager, RelayError> {
    let primary = primary_driver(config).await?;
    let launcher = HttpLauncher::new(config.resolver.request_timeout());
    RotationManager::new(
        config.accounts.profiles.clone(),
        config.accounts.rotation_interval(),
        tokens,
        Arc::new(primary),
        Arc::new(launcher),
    )
}

/// Rotate until `name` is active. Fails for unknown names.
async fn select_account(rotation: &RotationManager, name: &str) -> Result<(), RelayError> {
    if !rotation.accounts().iter().any(|a| a.name == name) {
        return Err(RelayError::Config(format!("unknown account '{name}'")));
    }
    while rotation.current().name != name {
        rotation.force_rotate().await;
    }
    Ok(())
}

pub async fn run_resolve(
    config: &RelayConfig,
    url: &str,
    account: Option<&str>,
) -> Result<(), RelayError> {
    let tokens = Arc::new(TokenCache::new(config.auth.clone()));
    let rotation = rotation_manager(config, tokens.clone()).await?;
    if let Some(name) = account {
        select_account(&rotation, name).await?;
    }
    let resolver = LinkResolver::new(
        config.resolver.clone(),
        config.auth.token_header.clone(),
        tokens,
    )?;

    if !resolver.is_candidate(url) {
        println!("note: {url} does not look like a marketplace link, trying anyway");
    }

    let cancel = linkrelay_agent::install_signal_handler();
    let outcome = async {
        let session = rotation.active_session().await?;
        let link = tokio::select! {
            result = resolver.resolve(url, &session) => result?,
            () = cancel.cancelled() => {
                return Err(RelayError::Internal("interrupted".into()));
            }
        };
        Ok::<_, RelayError>((session.account.name.clone(), link))
    }
    .await;
    cancel.cancel();
    rotation.close().await;

    let (account, link) = outcome?;
    println!("account:   {account}");
    println!("affiliate: {}", link.affiliate_url);
    println!("canonical: {}", link.canonical_url);
    Ok(())
}

pub async fn run_rotate(config: &RelayConfig) -> Result<(), RelayError> {
    let tokens = Arc::new(TokenCache::new(config.auth.clone()));
    let rotation = rotation_manager(config, tokens).await?;
    let first = rotation.current();
    let total = rotation.accounts().len();

    println!("active: {} (tag {})", first.name, first.affiliate_tag);
    for step in 1..=total {
        let next = rotation.force_rotate().await;
        println!("rotate {step}/{total}: {} (tag {})", next.name, next.affiliate_tag);
    }

    let back = rotation.current();
    if back.name != first.name {
        return Err(RelayError::Internal(format!(
            "rotation ended on '{}' instead of '{}'",
            back.name, first.name
        )));
    }
    info!(accounts = total, "rotation cycle complete");
    rotation.close().await;
    Ok(())
}
