// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Link resolution engine.
//!
//! Turns a link shared in a source message into an affiliate link for the
//! active account. Two strategies exist:
//!
//! - **tag rewrite** for storefronts tracked by a query parameter: the
//!   canonical product URL gets the account's tag, no token involved;
//! - **endpoint** for everything else: follow the link (and any
//!   interstitial page) to the canonical product URL, then ask the
//!   link-creation endpoint for a short link, authenticated with the
//!   account's session token.
//!
//! Every attempt starts from scratch; attempts are bounded by
//! [`RetryPolicy`].

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, warn};

use linkrelay_accounts::{ActiveSession, TokenCache};
use linkrelay_config::model::ResolverConfig;
use linkrelay_core::{
    AutomationDriver, EndpointRequest, HttpMethod, Platform, RelayError, ResolutionKind,
    ResolvedLink,
};
use linkrelay_extract::{
    Storefront, canonical_tagged_url, extract_one, force_query_param, host_matches, host_of,
    strip_tracking,
};
use linkrelay_resilience::RetryPolicy;

use crate::response::extract_short_link;

/// Parameter used when a storefront has no known affiliate parameter.
const DEFAULT_TAG_PARAM: &str = "tag";

/// Longest response body excerpt kept in an error.
const BODY_EXCERPT: usize = 300;

pub struct LinkResolver {
    config: ResolverConfig,
    token_header: String,
    product_marker: Regex,
    retry: RetryPolicy,
    tokens: Arc<TokenCache>,
}

impl LinkResolver {
    /// Fails when `config.product_marker` does not compile.
    pub fn new(
        config: ResolverConfig,
        token_header: impl Into<String>,
        tokens: Arc<TokenCache>,
    ) -> Result<Self, RelayError> {
        let product_marker = Regex::new(&config.product_marker).map_err(|e| {
            RelayError::Config(format!("resolver.product_marker does not compile: {e}"))
        })?;
        let retry = RetryPolicy::new(config.max_retries, config.backoff());
        Ok(Self {
            config,
            token_header: token_header.into(),
            product_marker,
            retry,
            tokens,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// `true` for links worth resolving: short links, product pages, or
    /// links on a tag-rewrite storefront.
    pub fn is_candidate(&self, url: &str) -> bool {
        linkrelay_extract::is_short_link(url, &self.config.short_link_path)
            || extract_one(url).is_some()
            || self.is_tag_rewrite_host(url)
    }

    fn is_tag_rewrite_host(&self, url: &str) -> bool {
        host_of(url).is_some_and(|host| host_matches(&host, &self.config.tag_rewrite_hosts))
    }

    /// Resolve `raw` for the account of `session`, retrying per policy.
    pub async fn resolve(
        &self,
        raw: &str,
        session: &ActiveSession,
    ) -> Result<ResolvedLink, RelayError> {
        let raw = raw.trim();
        let link = self
            .retry
            .run(|attempt| self.attempt(raw, session, attempt))
            .await?;
        info!(
            account = %session.account.name,
            original = %link.original_url,
            affiliate = %link.affiliate_url,
            "link resolved"
        );
        Ok(link)
    }

    async fn attempt(
        &self,
        raw: &str,
        session: &ActiveSession,
        attempt: u32,
    ) -> Result<ResolvedLink, RelayError> {
        let driver = session.driver.as_ref();
        debug!(account = %session.account.name, url = raw, attempt, "resolving link");

        let landing = driver.navigate(raw).await.map_err(driver_failure)?;

        if self.wants_tag_rewrite(raw, &landing) {
            return self.rewrite_tag(raw, &landing, session).await;
        }

        let canonical = self.reach_product_page(driver, landing).await?;
        self.create_link(raw, &canonical, session).await
    }

    fn wants_tag_rewrite(&self, raw: &str, landing: &str) -> bool {
        let market_b = |url: &str| {
            extract_one(url).is_some_and(|reference| reference.platform == Platform::MarketB)
        };
        market_b(raw) || market_b(landing) || self.is_tag_rewrite_host(landing)
    }

    async fn rewrite_tag(
        &self,
        raw: &str,
        landing: &str,
        session: &ActiveSession,
    ) -> Result<ResolvedLink, RelayError> {
        let tag = &session.account.affiliate_tag;

        let from_url = [landing, raw].into_iter().find_map(|url| {
            extract_one(url)
                .filter(|reference| reference.platform == Platform::MarketB)
                .map(|reference| reference.id)
        });
        let id = match from_url {
            Some(id) => Some(id),
            None => session
                .driver
                .read_page_marker(&self.config.product_id_markers)
                .await
                .map_err(driver_failure)?
                .map(|value| value.trim().to_ascii_uppercase())
                .filter(|value| is_product_code(value)),
        };

        let affiliate_url = match id.and_then(|id| canonical_tagged_url(landing, &id, tag)) {
            Some(url) => url,
            None => {
                let param = Storefront::from_url(landing)
                    .affiliate_param()
                    .unwrap_or(DEFAULT_TAG_PARAM);
                warn!(url = landing, "no product id found, forcing affiliate parameter");
                force_query_param(landing, param, tag)
            }
        };

        Ok(ResolvedLink {
            original_url: raw.to_string(),
            canonical_url: strip_tracking(&affiliate_url),
            affiliate_url,
        })
    }

    /// Advance through interstitial pages until the URL looks like a product.
    async fn reach_product_page(
        &self,
        driver: &dyn AutomationDriver,
        landing: String,
    ) -> Result<String, RelayError> {
        let mut current = landing;
        let mut steps = 0;
        // The marker must survive stripping: a product id only in the query
        // does not make a product page.
        while !self.is_product_url(&current) && steps < self.config.interstitial_steps {
            steps += 1;
            let acted = driver
                .perform_named_action(&self.config.advance_actions)
                .await
                .map_err(driver_failure)?;
            current = driver.current_url().await.map_err(driver_failure)?;
            debug!(step = steps, acted, url = %current, "interstitial step");
            if !acted {
                break;
            }
        }

        let canonical = strip_tracking(&current);
        if self.product_marker.is_match(&canonical) {
            Ok(canonical)
        } else {
            Err(RelayError::resolution(
                ResolutionKind::NotAProductPage,
                current,
            ))
        }
    }

    fn is_product_url(&self, url: &str) -> bool {
        self.product_marker.is_match(&strip_tracking(url))
    }

    async fn create_link(
        &self,
        raw: &str,
        canonical: &str,
        session: &ActiveSession,
    ) -> Result<ResolvedLink, RelayError> {
        let account = &session.account;
        let token = self
            .tokens
            .get_token(account, session.driver.as_ref())
            .await
            .map_err(|e| RelayError::resolution(ResolutionKind::NoAuth, e.to_string()))?;

        let body = serde_json::json!({
            "url": canonical,
            "tag": account.affiliate_tag,
        });
        let request = EndpointRequest {
            method: HttpMethod::Post,
            url: self.config.create_link_url.clone(),
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                (self.token_header.clone(), token.as_str().to_string()),
            ],
            body: Some(body.to_string()),
        };

        let response = session
            .driver
            .call_endpoint(request)
            .await
            .map_err(driver_failure)?;

        if response.is_auth_rejection() {
            self.tokens.invalidate(&account.name).await;
            return Err(RelayError::resolution(
                ResolutionKind::Unauthorized,
                format!("status {}", response.status),
            ));
        }
        if !response.is_success() {
            return Err(RelayError::resolution(
                ResolutionKind::EndpointStatus,
                format!("status {}: {}", response.status, excerpt(&response.body)),
            ));
        }

        let affiliate_url =
            extract_short_link(&response.body, &self.config.short_link_path, canonical)
                .ok_or_else(|| {
                    RelayError::resolution(ResolutionKind::BadResponse, excerpt(&response.body))
                })?;

        Ok(ResolvedLink {
            original_url: raw.to_string(),
            affiliate_url,
            canonical_url: canonical.to_string(),
        })
    }
}

fn driver_failure(e: RelayError) -> RelayError {
    RelayError::resolution(ResolutionKind::Driver, e.to_string())
}

fn is_product_code(value: &str) -> bool {
    value.len() == 10 && value.chars().all(|c| c.is_ascii_alphanumeric())
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
