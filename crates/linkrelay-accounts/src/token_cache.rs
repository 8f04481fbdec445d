// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-account session token cache with single-flight fetching.
//!
//! Each account owns a slot guarded by an async mutex. Whoever holds the
//! mutex with an empty slot performs the fetch; callers queued behind it
//! either find the token it stored or, if that fetch failed, get the same
//! failure instead of starting another fetch. A caller that arrives after
//! a failed fetch completed starts a fresh one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use linkrelay_config::model::AuthConfig;
use linkrelay_core::{AccountCredential, AutomationDriver, RelayError, SessionToken};
use tracing::{debug, info, warn};

/// Failure reason when the page carries no token.
pub const NO_TOKEN_FOUND: &str = "no-token-found";

#[derive(Default)]
struct Slot {
    /// Completed fetches; lets a waiter tell whether a fetch finished while
    /// it was queued.
    completed: AtomicU64,
    state: tokio::sync::Mutex<SlotState>,
}

#[derive(Default)]
struct SlotState {
    token: Option<SessionToken>,
    last_error: Option<String>,
}

/// Counters for operators and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenCacheStats {
    pub fetches: u64,
    pub invalidations: u64,
}

pub struct TokenCache {
    auth: AuthConfig,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
    fetches: AtomicU64,
    invalidations: AtomicU64,
}

impl TokenCache {
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            slots: Mutex::new(HashMap::new()),
            fetches: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    fn slot(&self, account: &str) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(account.to_string()).or_default().clone()
    }

    /// Cached token for `account`, fetching it through `driver` if needed.
    pub async fn get_token(
        &self,
        account: &AccountCredential,
        driver: &dyn AutomationDriver,
    ) -> Result<SessionToken, RelayError> {
        let slot = self.slot(&account.name);
        let seen = slot.completed.load(Ordering::SeqCst);
        let mut state = slot.state.lock().await;

        if let Some(token) = &state.token {
            return Ok(token.clone());
        }
        if slot.completed.load(Ordering::SeqCst) != seen
            && let Some(reason) = &state.last_error
        {
            debug!(account = %account.name, "sharing failure of concurrent token fetch");
            return Err(auth_error(account, reason));
        }

        self.fetches.fetch_add(1, Ordering::SeqCst);
        let outcome = self.fetch(driver).await;
        slot.completed.fetch_add(1, Ordering::SeqCst);

        match outcome {
            Ok(token) => {
                info!(account = %account.name, "session token fetched");
                state.token = Some(token.clone());
                state.last_error = None;
                Ok(token)
            }
            Err(reason) => {
                warn!(account = %account.name, reason = %reason, "session token fetch failed");
                state.last_error = Some(reason.clone());
                Err(auth_error(account, &reason))
            }
        }
    }

    async fn fetch(&self, driver: &dyn AutomationDriver) -> Result<SessionToken, String> {
        driver
            .navigate(&self.auth.url)
            .await
            .map_err(|e| format!("auth page unreachable: {e}"))?;
        match driver.read_page_marker(&self.auth.token_markers).await {
            Ok(Some(value)) if !value.trim().is_empty() => Ok(SessionToken::new(value.trim())),
            Ok(_) => Err(NO_TOKEN_FOUND.to_string()),
            Err(e) => Err(format!("token marker unreadable: {e}")),
        }
    }

    /// Drop the cached token of `account`; the next `get_token` fetches.
    pub async fn invalidate(&self, account: &str) {
        let slot = self.slot(account);
        let mut state = slot.state.lock().await;
        state.token = None;
        state.last_error = None;
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        debug!(account, "session token invalidated");
    }

    /// Drop every cached token.
    pub async fn invalidate_all(&self) {
        let names: Vec<String> = {
            let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.keys().cloned().collect()
        };
        for name in names {
            self.invalidate(&name).await;
        }
    }

    /// Whether a token for `account` is cached right now.
    pub async fn is_cached(&self, account: &str) -> bool {
        self.slot(account).state.lock().await.token.is_some()
    }

    pub fn stats(&self) -> TokenCacheStats {
        TokenCacheStats {
            fetches: self.fetches.load(Ordering::SeqCst),
            invalidations: self.invalidations.load(Ordering::SeqCst),
        }
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}

fn auth_error(account: &AccountCredential, reason: &str) -> RelayError {
    RelayError::Auth {
        account: account.name.clone(),
        reason: reason.to_string(),
    }
}
