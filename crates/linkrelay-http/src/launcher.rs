// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Isolated HTTP sessions built from cookie profiles.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use linkrelay_core::{AccountCredential, AutomationDriver, RelayError, SessionLauncher};

use crate::driver::HttpDriver;

/// Opens one [`HttpDriver`] per account.
///
/// An account's `session_profile` is the path of a file whose contents are
/// sent as the `Cookie` header. Relative paths resolve against `profile_dir`.
#[derive(Debug, Clone)]
pub struct HttpLauncher {
    timeout: Duration,
    profile_dir: Option<PathBuf>,
}

impl HttpLauncher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            profile_dir: None,
        }
    }

    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }

    fn profile_path(&self, profile: &str) -> PathBuf {
        let path = PathBuf::from(profile);
        match &self.profile_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    async fn open_isolated(
        &self,
        account: &AccountCredential,
    ) -> Result<Arc<dyn AutomationDriver>, RelayError> {
        let session_error = |message: String| RelayError::Session {
            account: account.name.clone(),
            message,
        };

        let profile = account.session_profile.trim();
        if profile.is_empty() {
            return Err(session_error("no session profile configured".into()));
        }
        let path = self.profile_path(profile);
        let cookie = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| session_error(format!("cannot read profile {}: {e}", path.display())))?;

        let driver = HttpDriver::new(self.timeout, Some(&cookie))
            .map_err(|e| session_error(e.to_string()))?;
        info!(account = %account.name, profile = %path.display(), "isolated session opened");
        Ok(Arc::new(driver))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn account(profile: &str) -> AccountCredential {
        AccountCredential {
            name: "side".into(),
            session_profile: profile.into(),
            affiliate_tag: "side-20".into(),
            uses_shared_session: false,
        }
    }

    #[tokio::test]
    async fn profile_cookie_is_used_by_the_session() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("side.cookie"), "sid=side-1\n").unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("cookie", "sid=side-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let launcher = HttpLauncher::new(Duration::from_secs(5)).with_profile_dir(dir.path());
        let driver = launcher.open_isolated(&account("side.cookie")).await.unwrap();
        driver.navigate(&server.uri()).await.unwrap();
    }

    #[tokio::test]
    async fn missing_profile_is_a_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = HttpLauncher::new(Duration::from_secs(5)).with_profile_dir(dir.path());

        for profile in ["", "absent.cookie"] {
            let err = launcher.open_isolated(&account(profile)).await.err().unwrap();
            assert!(
                matches!(err, RelayError::Session { ref account, .. } if account == "side"),
                "unexpected error for {profile:?}: {err}"
            );
        }
    }
}
