//! Verb-based HTTP port shared by all adapters.
//!
//! Adapters never talk to a concrete HTTP library; they build an
//! [`ApiRequest`] and hand it to an [`ApiClient`]. The production
//! implementation is [`BearerClient`] (reqwest, bearer token captured
//! at construction); tests inject a recording fake implementing the
//! same trait.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::provider::BoxFuture;

/// Default per-request timeout for the production client.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Returns the verb name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// A provider API request: verb, path, query, headers, optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// The HTTP verb.
    pub method: Method,
    /// The path below the client's base URL, starting with `/`.
    pub path: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Creates a POST request with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        let mut request = Self::new(Method::Post, path);
        request.body = Some(body);
        request
    }

    /// Creates a PATCH request with a JSON body.
    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        let mut request = Self::new(Method::Patch, path);
        request.body = Some(body);
        request
    }

    /// Creates a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Builder method to append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Builder method to append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the value of a query parameter, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of a header, if present.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Minimal capability interface for executing provider API requests.
///
/// `Ok(None)` means the provider answered with an empty body (204 or an
/// empty 200), which delete-style operations treat as success.
pub trait ApiClient: Send + Sync {
    /// Executes a request and returns the decoded JSON body, if any.
    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<Option<Value>, ApiError>>;
}

/// Unwraps a response body that the operation requires to be present.
pub(crate) fn require_body(body: Option<Value>) -> Result<Value, crate::error::MapError> {
    body.ok_or(crate::error::MapError::MissingField("response body"))
}

/// reqwest-backed [`ApiClient`] that presents a bearer token on every
/// request.
///
/// The token is captured once at construction and never refreshed;
/// token lifecycle belongs to the caller's auth layer.
#[derive(Debug)]
pub struct BearerClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl BearerClient {
    /// Creates a client for the given API base URL and access token.
    pub fn new(base_url: &str, access_token: impl Into<String>) -> Result<Self, ApiError> {
        Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("invalid base URL `{base_url}`: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = request.method.as_str(), path = %request.path, "provider API request");

        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Patch => self.http.patch(&url),
            Method::Delete => self.http.delete(&url),
        };

        builder = builder.bearer_auth(&self.access_token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response: {e}")))?;
        if text.is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&text)?;
        Ok(Some(value))
    }
}

impl ApiClient for BearerClient {
    fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<Option<Value>, ApiError>> {
        Box::pin(self.dispatch(request))
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! A recording fake for adapter tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// [`ApiClient`] that records every request and plays back queued
    /// responses in order. An exhausted queue yields empty bodies.
    #[derive(Default)]
    pub struct FakeClient {
        requests: Mutex<Vec<ApiRequest>>,
        responses: Mutex<VecDeque<Result<Option<Value>, ApiError>>>,
    }

    impl FakeClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a JSON response.
        pub fn push_json(&self, value: Value) {
            self.responses.lock().unwrap().push_back(Ok(Some(value)));
        }

        /// Queues an empty (204-style) response.
        pub fn push_empty(&self) {
            self.responses.lock().unwrap().push_back(Ok(None));
        }

        /// Queues a failure.
        pub fn push_error(&self, error: ApiError) {
            self.responses.lock().unwrap().push_back(Err(error));
        }

        /// Returns all requests executed so far.
        pub fn recorded(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ApiClient for FakeClient {
        fn execute(&self, request: ApiRequest) -> BoxFuture<'_, Result<Option<Value>, ApiError>> {
            self.requests.lock().unwrap().push(request);
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(None));
            Box::pin(async move { next })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builders() {
        let request = ApiRequest::get("/me/calendars")
            .with_query("$select", "id,name")
            .with_header("Prefer", "outlook.timezone=\"UTC\"");

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/me/calendars");
        assert_eq!(request.query_value("$select"), Some("id,name"));
        assert_eq!(
            request.header_value("prefer"),
            Some("outlook.timezone=\"UTC\"")
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn post_carries_body() {
        let request = ApiRequest::post("/calendars", json!({"summary": "Work"}));
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body.unwrap()["summary"], "Work");
    }

    #[test]
    fn bearer_client_construction() {
        assert!(BearerClient::new("https://graph.microsoft.com/v1.0", "token").is_ok());
        assert!(BearerClient::new("not a url", "token").is_err());
    }

    #[tokio::test]
    async fn fake_records_and_plays_back() {
        let client = fake::FakeClient::new();
        client.push_json(json!({"ok": true}));
        client.push_error(ApiError::Timeout);

        let first = client.execute(ApiRequest::get("/a")).await.unwrap();
        assert_eq!(first.unwrap()["ok"], true);

        let second = client.execute(ApiRequest::delete("/b")).await;
        assert!(matches!(second, Err(ApiError::Timeout)));

        let recorded = client.recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].path, "/a");
        assert_eq!(recorded[1].method, Method::Delete);
    }
}
