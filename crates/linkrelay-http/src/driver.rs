// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`AutomationDriver`] over plain HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use tokio::sync::Mutex;
use tracing::debug;

use linkrelay_core::{AutomationDriver, EndpointRequest, EndpointResponse, HttpMethod, RelayError};

use crate::page;

const DEFAULT_USER_AGENT: &str = concat!("linkrelay/", env!("CARGO_PKG_VERSION"));

/// The page the driver is currently "showing".
#[derive(Debug, Default)]
struct Page {
    url: String,
    body: String,
}

#[derive(Debug, Default)]
struct DriverState {
    page: Option<Page>,
    closed: bool,
}

/// Stateless-browser driver: every navigation is a GET whose final URL and
/// body become the current page.
///
/// Named actions can only follow links present in the markup (meta refresh
/// or anchor text); nothing is scripted.
#[derive(Debug)]
pub struct HttpDriver {
    client: reqwest::Client,
    cookie: Option<HeaderValue>,
    state: Mutex<DriverState>,
}

impl HttpDriver {
    /// Creates a driver with a per-request `timeout`.
    ///
    /// `cookie`, when given, is sent verbatim as the `Cookie` header on every
    /// request.
    pub fn new(timeout: Duration, cookie: Option<&str>) -> Result<Self, RelayError> {
        let cookie = cookie
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(|e| RelayError::Config(format!("invalid cookie header value: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| RelayError::Driver {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            cookie,
            state: Mutex::new(DriverState::default()),
        })
    }

    fn with_cookie(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie.clone()),
            None => builder,
        }
    }

    async fn ensure_open(&self) -> Result<(), RelayError> {
        if self.state.lock().await.closed {
            return Err(RelayError::driver("session closed"));
        }
        Ok(())
    }

    async fn current_page(&self) -> Result<Option<(String, String)>, RelayError> {
        let state = self.state.lock().await;
        if state.closed {
            return Err(RelayError::driver("session closed"));
        }
        Ok(state.page.as_ref().map(|p| (p.url.clone(), p.body.clone())))
    }
}

fn request_failed(what: &str, e: reqwest::Error) -> RelayError {
    RelayError::Driver {
        message: format!("{what} failed: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl AutomationDriver for HttpDriver {
    async fn navigate(&self, url: &str) -> Result<String, RelayError> {
        self.ensure_open().await?;
        let response = self
            .with_cookie(self.client.get(url))
            .send()
            .await
            .map_err(|e| request_failed("navigation", e))?;
        let landed = response.url().to_string();
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_failed("reading page body", e))?;
        debug!(url, landed = %landed, status = %status, "navigated");

        let mut state = self.state.lock().await;
        state.page = Some(Page {
            url: landed.clone(),
            body,
        });
        Ok(landed)
    }

    async fn current_url(&self) -> Result<String, RelayError> {
        self.current_page()
            .await?
            .map(|(url, _)| url)
            .ok_or_else(|| RelayError::driver("no page loaded"))
    }

    async fn perform_named_action(&self, hints: &[String]) -> Result<bool, RelayError> {
        let Some((url, body)) = self.current_page().await? else {
            return Ok(false);
        };
        let target = page::meta_refresh_target(&body, &url)
            .or_else(|| page::anchor_target(&body, &url, hints));
        match target {
            Some(target) => {
                debug!(from = %url, to = %target, "following page action");
                self.navigate(&target).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn read_page_marker(&self, hints: &[String]) -> Result<Option<String>, RelayError> {
        Ok(self
            .current_page()
            .await?
            .and_then(|(_, body)| page::marker_value(&body, hints)))
    }

    async fn call_endpoint(
        &self,
        request: EndpointRequest,
    ) -> Result<EndpointResponse, RelayError> {
        self.ensure_open().await?;
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        };
        let mut builder = self.with_cookie(self.client.request(method, &request.url));
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RelayError::driver(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RelayError::driver(format!("invalid value for header {name}: {e}")))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| request_failed("endpoint call", e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| request_failed("reading endpoint body", e))?;
        debug!(url = %request.url, status, "endpoint answered");
        Ok(EndpointResponse { status, body })
    }

    async fn close(&self) -> Result<(), RelayError> {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.page = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn driver() -> HttpDriver {
        HttpDriver::new(Duration::from_secs(5), None).unwrap()
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string(body)
    }

    #[tokio::test]
    async fn navigation_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sec/AB12"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/item/MLB999"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/item/MLB999"))
            .respond_with(html("<h1>product</h1>"))
            .mount(&server)
            .await;

        let driver = driver();
        let landed = driver
            .navigate(&format!("{}/sec/AB12", server.uri()))
            .await
            .unwrap();
        assert_eq!(landed, format!("{}/item/MLB999", server.uri()));
        assert_eq!(driver.current_url().await.unwrap(), landed);
    }

    #[tokio::test]
    async fn named_action_follows_matching_anchor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/social/list"))
            .respond_with(html(r#"<a href="/item/MLB5">Ir para produto</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/item/MLB5"))
            .respond_with(html("ok"))
            .mount(&server)
            .await;

        let driver = driver();
        driver
            .navigate(&format!("{}/social/list", server.uri()))
            .await
            .unwrap();

        let hints = vec!["Ir para produto".to_string()];
        assert!(driver.perform_named_action(&hints).await.unwrap());
        assert_eq!(
            driver.current_url().await.unwrap(),
            format!("{}/item/MLB5", server.uri())
        );
        assert!(!driver.perform_named_action(&hints).await.unwrap());
    }

    #[tokio::test]
    async fn named_action_without_page_is_a_no_op() {
        assert!(!driver().perform_named_action(&["x".into()]).await.unwrap());
    }

    #[tokio::test]
    async fn marker_is_read_from_current_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/panel"))
            .respond_with(html(r#"<meta name="csrf-token" content="tok-1">"#))
            .mount(&server)
            .await;

        let driver = driver();
        driver.navigate(&format!("{}/panel", server.uri())).await.unwrap();
        let marker = driver
            .read_page_marker(&["csrf-token".into()])
            .await
            .unwrap();
        assert_eq!(marker.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn endpoint_call_carries_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create"))
            .and(header("x-csrf-token", "tok-1"))
            .and(body_string(r#"{"url":"u"}"#))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":"ZZ9"}"#))
            .mount(&server)
            .await;

        let response = driver()
            .call_endpoint(EndpointRequest {
                method: HttpMethod::Post,
                url: format!("{}/create", server.uri()),
                headers: vec![("x-csrf-token".into(), "tok-1".into())],
                body: Some(r#"{"url":"u"}"#.into()),
            })
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.body, r#"{"id":"ZZ9"}"#);
    }

    #[tokio::test]
    async fn rejection_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let response = driver()
            .call_endpoint(EndpointRequest {
                method: HttpMethod::Post,
                url: server.uri(),
                headers: Vec::new(),
                body: None,
            })
            .await
            .unwrap();
        assert!(response.is_auth_rejection());
    }

    #[tokio::test]
    async fn cookie_is_sent_on_every_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("cookie", "sid=abc"))
            .respond_with(html("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let driver = HttpDriver::new(Duration::from_secs(5), Some("sid=abc\n")).unwrap();
        driver.navigate(&server.uri()).await.unwrap();
    }

    #[tokio::test]
    async fn closed_driver_refuses_work() {
        let driver = driver();
        driver.close().await.unwrap();
        assert!(matches!(
            driver.navigate("http://127.0.0.1:9/").await,
            Err(RelayError::Driver { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_driver_error() {
        let err = driver().navigate("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.is_driver());
    }
}
