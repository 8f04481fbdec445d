// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timed rotation among credentialed accounts.
//!
//! The active account advances circularly once per interval. Rotation is
//! lazy: it happens on the next call to [`RotationManager::active_account`]
//! or [`RotationManager::active_session`] after the interval elapsed, or on
//! demand through [`RotationManager::force_rotate`]. Each rotation closes the
//! outgoing isolated session and invalidates every cached token.
//!
//! Readers that only need to know who is active use
//! [`RotationManager::current`], a lock-free snapshot that never rotates.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use linkrelay_core::{AccountCredential, AutomationDriver, RelayError, SessionLauncher};

use crate::token_cache::TokenCache;

/// An account together with the driver its work must run on.
#[derive(Clone)]
pub struct ActiveSession {
    pub account: Arc<AccountCredential>,
    pub driver: Arc<dyn AutomationDriver>,
}

impl std::fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("account", &self.account.name)
            .finish_non_exhaustive()
    }
}

struct RotationState {
    index: usize,
    last_rotation: Instant,
    /// Session opened for the active account when it cannot share the primary one.
    isolated: Option<Arc<dyn AutomationDriver>>,
}

pub struct RotationManager {
    accounts: Vec<Arc<AccountCredential>>,
    interval: Duration,
    current: ArcSwap<AccountCredential>,
    state: Mutex<RotationState>,
    tokens: Arc<TokenCache>,
    primary: Arc<dyn AutomationDriver>,
    launcher: Arc<dyn SessionLauncher>,
}

impl RotationManager {
    /// Start on the first account. Fails only when `accounts` is empty.
    pub fn new(
        accounts: Vec<AccountCredential>,
        interval: Duration,
        tokens: Arc<TokenCache>,
        primary: Arc<dyn AutomationDriver>,
        launcher: Arc<dyn SessionLauncher>,
    ) -> Result<Self, RelayError> {
        let accounts: Vec<Arc<AccountCredential>> = accounts.into_iter().map(Arc::new).collect();
        let first = accounts
            .first()
            .cloned()
            .ok_or_else(|| RelayError::Config("at least one account is required".into()))?;

        Ok(Self {
            accounts,
            interval,
            current: ArcSwap::new(first),
            state: Mutex::new(RotationState {
                index: 0,
                last_rotation: Instant::now(),
                isolated: None,
            }),
            tokens,
            primary,
            launcher,
        })
    }

    /// Snapshot of the active account, without rotating.
    pub fn current(&self) -> Arc<AccountCredential> {
        self.current.load_full()
    }

    pub fn accounts(&self) -> &[Arc<AccountCredential>] {
        &self.accounts
    }

    pub fn tokens(&self) -> &Arc<TokenCache> {
        &self.tokens
    }

    /// Active account, rotating first if the interval has elapsed.
    pub async fn active_account(&self) -> Arc<AccountCredential> {
        let mut state = self.state.lock().await;
        if state.last_rotation.elapsed() >= self.interval {
            self.rotate(&mut state).await;
        }
        self.accounts[state.index].clone()
    }

    /// Rotate now, regardless of the timer. Returns the new active account.
    pub async fn force_rotate(&self) -> Arc<AccountCredential> {
        let mut state = self.state.lock().await;
        self.rotate(&mut state).await;
        self.accounts[state.index].clone()
    }

    /// Active account and the driver to use for it.
    ///
    /// Accounts that share the primary session get the primary driver; the
    /// others get an isolated session, opened on first use.
    pub async fn active_session(&self) -> Result<ActiveSession, RelayError> {
        let mut state = self.state.lock().await;
        if state.last_rotation.elapsed() >= self.interval {
            self.rotate(&mut state).await;
        }
        let account = self.accounts[state.index].clone();

        if account.uses_shared_session {
            return Ok(ActiveSession {
                account,
                driver: self.primary.clone(),
            });
        }

        if let Some(driver) = &state.isolated {
            return Ok(ActiveSession {
                account,
                driver: driver.clone(),
            });
        }

        let driver = self
            .launcher
            .open_isolated(&account)
            .await
            .map_err(|e| match e {
                RelayError::Session { .. } => e,
                other => RelayError::Session {
                    account: account.name.clone(),
                    message: other.to_string(),
                },
            })?;
        info!(account = %account.name, "isolated session opened");
        state.isolated = Some(driver.clone());
        Ok(ActiveSession { account, driver })
    }

    /// Release the isolated session, if any.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        let account = self.accounts[state.index].clone();
        Self::close_isolated(&mut state, &account.name).await;
    }

    async fn close_isolated(state: &mut RotationState, account: &str) {
        if let Some(driver) = state.isolated.take()
            && let Err(e) = driver.close().await
        {
            warn!(account, error = %e, "failed to close isolated session");
        }
    }

    async fn rotate(&self, state: &mut RotationState) {
        let outgoing = self.accounts[state.index].clone();
        Self::close_isolated(state, &outgoing.name).await;

        state.index = (state.index + 1) % self.accounts.len();
        state.last_rotation = Instant::now();
        self.tokens.invalidate_all().await;

        let incoming = self.accounts[state.index].clone();
        self.current.store(incoming.clone());
        info!(from = %outgoing.name, to = %incoming.name, "account rotated");
    }
}
