//! HTTP access to the dashboard server's poll and action endpoints.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use homeboard_protocol::{Action, Domain};
use serde_json::Value;
use tracing::debug;

use crate::errors::{CoreError, FetchError};

/// Server calls the core makes. Boxed futures keep the trait object-safe so
/// tests can substitute an in-memory server.
pub trait DashboardApi: Send + Sync + 'static {
    /// GET the domain's poll endpoint and return the decoded payload.
    fn fetch(&self, domain: Domain) -> BoxFuture<'static, Result<Value, FetchError>>;

    /// POST an action. The response body is returned but not rendered.
    fn post(&self, action: &Action) -> BoxFuture<'static, Result<Value, FetchError>>;
}

/// Polls use the client-wide `timeout`; action POSTs override it with
/// `action_timeout`, since some actions answer only once the work is done.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    action_timeout: Duration,
}

impl HttpApi {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        action_timeout: Duration,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::HttpClient {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            action_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn action_timeout(&self) -> Duration {
        self.action_timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl DashboardApi for HttpApi {
    fn fetch(&self, domain: Domain) -> BoxFuture<'static, Result<Value, FetchError>> {
        let url = self.url(domain.endpoint());
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        async move {
            debug!(event = "core.api.fetch_started", domain = %domain, url = %url);
            read_json(url, request).await
        }
        .boxed()
    }

    fn post(&self, action: &Action) -> BoxFuture<'static, Result<Value, FetchError>> {
        let url = self.url(&action.path());
        let mut request = self
            .client
            .post(&url)
            .timeout(self.action_timeout)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = action.body() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }
        let name = action.name();
        async move {
            debug!(event = "core.api.post_started", action = name, url = %url);
            read_json(url, request).await
        }
        .boxed()
    }
}

async fn read_json(url: String, request: reqwest::RequestBuilder) -> Result<Value, FetchError> {
    let response = request.send().await.map_err(|e| FetchError::Transport {
        url: url.clone(),
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| FetchError::Transport {
        url: url.clone(),
        message: e.to_string(),
    })?;
    decode_body(&url, &body)
}

/// Parse a response body, turning the server's `{"error": "..."}` envelope
/// into a fetch failure.
pub fn decode_body(url: &str, body: &str) -> Result<Value, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Malformed {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(FetchError::Upstream {
            url: url.to_string(),
            message: message.to_string(),
        });
    }
    Ok(value)
}
