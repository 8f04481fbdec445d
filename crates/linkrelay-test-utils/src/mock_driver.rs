// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted automation driver.
//!
//! `MockDriver` answers navigation, actions, page markers and endpoint calls
//! from tables filled in by the test, and records every call for assertions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use linkrelay_core::{
    AccountCredential, AutomationDriver, EndpointRequest, EndpointResponse, RelayError,
    SessionLauncher,
};

/// A driver whose every answer is scripted.
///
/// - **routes**: `navigate(from)` lands on `to`; unknown URLs land on themselves
/// - **actions**: `perform_named_action` on page `from` moves to `to`
/// - **markers**: per-hint value queues; the last value repeats
/// - **responses**: endpoint responses popped in order
#[derive(Default)]
pub struct MockDriver {
    routes: Mutex<HashMap<String, String>>,
    actions: Mutex<HashMap<String, String>>,
    markers: Mutex<HashMap<String, VecDeque<String>>>,
    responses: Mutex<VecDeque<EndpointResponse>>,
    failing: Mutex<HashSet<String>>,
    current: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    requests: Mutex<Vec<EndpointRequest>>,
    marker_reads: AtomicUsize,
    navigation_delay: Mutex<Option<Duration>>,
    fail_everything: AtomicBool,
    closed: AtomicBool,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `navigate(from)` lands on `to`.
    pub fn with_route(mut self, from: &str, to: &str) -> Self {
        self.routes.get_mut().insert(from.into(), to.into());
        self
    }

    /// An advance action on page `from` moves to `to`.
    pub fn with_action(mut self, from: &str, to: &str) -> Self {
        self.actions.get_mut().insert(from.into(), to.into());
        self
    }

    /// Successive reads of `hint` return `values` in order, the last one
    /// repeating.
    pub fn with_marker_values(mut self, hint: &str, values: &[&str]) -> Self {
        self.markers.get_mut().insert(
            hint.into(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn with_marker(self, hint: &str, value: &str) -> Self {
        self.with_marker_values(hint, &[value])
    }

    /// Queue an endpoint response.
    pub fn with_response(mut self, status: u16, body: &str) -> Self {
        self.responses.get_mut().push_back(EndpointResponse {
            status,
            body: body.into(),
        });
        self
    }

    /// Navigation to `url` fails with a driver error.
    pub fn with_failing_navigation(mut self, url: &str) -> Self {
        self.failing.get_mut().insert(url.into());
        self
    }

    /// Every navigation sleeps for `delay` first.
    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        *self.navigation_delay.get_mut() = Some(delay);
        self
    }

    /// Make every call fail, as a crashed browser would.
    pub fn break_down(&self) {
        self.fail_everything.store(true, Ordering::SeqCst);
    }

    pub async fn push_response(&self, status: u16, body: &str) {
        self.responses.lock().await.push_back(EndpointResponse {
            status,
            body: body.into(),
        });
    }

    pub async fn navigations(&self) -> Vec<String> {
        self.navigations.lock().await.clone()
    }

    /// Navigations to exactly `url`.
    pub async fn navigation_count(&self, url: &str) -> usize {
        self.navigations
            .lock()
            .await
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    pub async fn requests(&self) -> Vec<EndpointRequest> {
        self.requests.lock().await.clone()
    }

    pub fn marker_reads(&self) -> usize {
        self.marker_reads.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_alive(&self) -> Result<(), RelayError> {
        if self.fail_everything.load(Ordering::SeqCst) {
            Err(RelayError::driver("mock driver is broken"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AutomationDriver for MockDriver {
    async fn navigate(&self, url: &str) -> Result<String, RelayError> {
        self.navigations.lock().await.push(url.to_string());
        let delay = *self.navigation_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_alive()?;
        if self.failing.lock().await.contains(url) {
            return Err(RelayError::driver(format!("navigation to {url} failed")));
        }
        let landing = self
            .routes
            .lock()
            .await
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string());
        *self.current.lock().await = landing.clone();
        Ok(landing)
    }

    async fn current_url(&self) -> Result<String, RelayError> {
        self.check_alive()?;
        Ok(self.current.lock().await.clone())
    }

    async fn perform_named_action(&self, _hints: &[String]) -> Result<bool, RelayError> {
        self.check_alive()?;
        let mut current = self.current.lock().await;
        match self.actions.lock().await.get(current.as_str()) {
            Some(next) => {
                *current = next.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn read_page_marker(&self, hints: &[String]) -> Result<Option<String>, RelayError> {
        self.check_alive()?;
        self.marker_reads.fetch_add(1, Ordering::SeqCst);
        let mut markers = self.markers.lock().await;
        for hint in hints {
            if let Some(values) = markers.get_mut(hint) {
                let value = if values.len() > 1 {
                    values.pop_front()
                } else {
                    values.front().cloned()
                };
                if value.is_some() {
                    return Ok(value);
                }
            }
        }
        Ok(None)
    }

    async fn call_endpoint(
        &self,
        request: EndpointRequest,
    ) -> Result<EndpointResponse, RelayError> {
        self.check_alive()?;
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| RelayError::driver("no scripted endpoint response left"))
    }

    async fn close(&self) -> Result<(), RelayError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Launcher handing out one [`MockDriver`] per account name.
#[derive(Default)]
pub struct MockLauncher {
    drivers: Mutex<HashMap<String, Arc<MockDriver>>>,
    failing: Mutex<HashSet<String>>,
    opened: Mutex<Vec<String>>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `driver` as the isolated session of `account`.
    pub fn with_driver(mut self, account: &str, driver: Arc<MockDriver>) -> Self {
        self.drivers.get_mut().insert(account.into(), driver);
        self
    }

    /// Opening a session for `account` fails.
    pub fn with_failure(mut self, account: &str) -> Self {
        self.failing.get_mut().insert(account.into());
        self
    }

    /// Account names in the order their sessions were opened.
    pub async fn opened(&self) -> Vec<String> {
        self.opened.lock().await.clone()
    }

    /// The driver handed out for `account`, if one was opened.
    pub async fn driver_for(&self, account: &str) -> Option<Arc<MockDriver>> {
        self.drivers.lock().await.get(account).cloned()
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn open_isolated(
        &self,
        account: &AccountCredential,
    ) -> Result<Arc<dyn AutomationDriver>, RelayError> {
        if self.failing.lock().await.contains(&account.name) {
            return Err(RelayError::Session {
                account: account.name.clone(),
                message: "profile could not be opened".into(),
            });
        }
        self.opened.lock().await.push(account.name.clone());
        let driver: Arc<dyn AutomationDriver> = self
            .drivers
            .lock()
            .await
            .entry(account.name.clone())
            .or_insert_with(|| Arc::new(MockDriver::new()))
            .clone();
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn routes_actions_and_markers_follow_script() {
        let driver = MockDriver::new()
            .with_route("https://x.example/sec/A", "https://x.example/social")
            .with_action("https://x.example/social", "https://x.example/item/MLB1")
            .with_marker_values("csrf", &["t1", "t2"]);

        let landing = driver.navigate("https://x.example/sec/A").await.unwrap();
        assert_eq!(landing, "https://x.example/social");
        assert!(driver.perform_named_action(&[]).await.unwrap());
        assert_eq!(driver.current_url().await.unwrap(), "https://x.example/item/MLB1");
        assert!(!driver.perform_named_action(&[]).await.unwrap());

        let hints = vec!["csrf".to_string()];
        assert_eq!(driver.read_page_marker(&hints).await.unwrap().as_deref(), Some("t1"));
        assert_eq!(driver.read_page_marker(&hints).await.unwrap().as_deref(), Some("t2"));
        assert_eq!(driver.read_page_marker(&hints).await.unwrap().as_deref(), Some("t2"));
        assert_eq!(driver.marker_reads(), 3);
    }

    #[tokio::test]
    async fn broken_driver_fails_every_call() {
        let driver = MockDriver::new();
        driver.break_down();
        assert!(driver.navigate("https://a.example").await.unwrap_err().is_driver());
        assert!(driver.current_url().await.is_err());
    }

    #[tokio::test]
    async fn launcher_reuses_driver_per_account() {
        let launcher = MockLauncher::new();
        let account = AccountCredential {
            name: "alt".into(),
            session_profile: String::new(),
            affiliate_tag: "t".into(),
            uses_shared_session: false,
        };
        launcher.open_isolated(&account).await.unwrap();
        launcher.open_isolated(&account).await.unwrap();
        assert_eq!(launcher.opened().await, vec!["alt", "alt"]);
        assert!(launcher.driver_for("alt").await.is_some());
    }
}
