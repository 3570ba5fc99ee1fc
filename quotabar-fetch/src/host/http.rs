//! HTTP transport abstraction and the async `reqwest` implementation.
//!
//! Every provider call goes through [`HttpTransport::request`], which has a
//! single shape: one attempt, a fixed timeout, and a response that is never an
//! error. Transport-level failures (DNS, refused connection, timeout, unreadable
//! body) become a response with status `0` and the error message as text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::HttpError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent by every transport.
pub const USER_AGENT: &str = concat!("quotabar/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Request / Response
// ============================================================================

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document (`application/json`).
    Json(Value),
    /// URL-encoded form (`application/x-www-form-urlencoded`).
    Form(Vec<(String, String)>),
}

/// A single outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Extra headers, in order.
    pub headers: Vec<(String, String)>,
    /// Optional body.
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a POST request without a body.
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(url)
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several headers.
    #[must_use]
    pub fn headers(mut self, headers: &[(&str, &str)]) -> Self {
        self.headers.extend(
            headers
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string())),
        );
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Sets a form body.
    #[must_use]
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = Some(RequestBody::Form(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ));
        self
    }

    /// Returns the value of a header (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Decoded response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body parsed as JSON.
    Json(Value),
    /// Body that is not JSON, or a transport error message.
    Text(String),
}

impl ResponseBody {
    /// Decodes raw bytes: JSON when it parses, text otherwise.
    pub fn decode(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// Response from [`HttpTransport::request`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code, or `0` for a transport failure.
    pub status: u16,
    /// Decoded body.
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Creates a JSON response.
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: ResponseBody::Json(body),
        }
    }

    /// Creates a text response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Text(body.into()),
        }
    }

    /// Creates the status-0 response for a transport failure.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::text(0, message)
    }

    /// Returns true for HTTP 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Returns true for transport failures.
    pub fn is_transport_failure(&self) -> bool {
        self.status == 0
    }

    /// Returns the JSON body, if the body parsed as JSON.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Returns the JSON body of a 200 response.
    pub fn ok_json(&self) -> Option<&Value> {
        if self.is_ok() { self.json_body() } else { None }
    }

    /// Returns the first `max_chars` characters of the body as text.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let text = match &self.body {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
        };
        text.chars().take(max_chars).collect()
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Uniform GET/POST transport.
///
/// Implementations make exactly one attempt per call and never retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Performs a request.
    async fn request(&self, request: HttpRequest) -> HttpResponse;

    /// Performs a GET request with headers.
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> HttpResponse {
        self.request(HttpRequest::get(url).headers(headers)).await
    }

    /// Performs a POST request with a JSON body.
    async fn post_json(&self, url: &str, headers: &[(&str, &str)], body: Value) -> HttpResponse {
        self.request(HttpRequest::post(url).headers(headers).json(body))
            .await
    }

    /// Performs a POST request with a form body.
    async fn post_form(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        form: &[(&str, &str)],
    ) -> HttpResponse {
        self.request(HttpRequest::post(url).headers(headers).form(form))
            .await
    }
}

// ============================================================================
// Reqwest Transport
// ============================================================================

/// Async transport backed by `reqwest` with rustls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { inner })
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut builder = match request.method {
            Method::Get => self.inner.get(&request.url),
            Method::Post => self.inner.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            Some(RequestBody::Json(body)) => builder.json(body),
            Some(RequestBody::Form(pairs)) => builder.form(pairs),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        Ok(HttpResponse {
            status,
            body: ResponseBody::decode(&bytes),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &'static str {
        "reqwest"
    }

    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    async fn request(&self, request: HttpRequest) -> HttpResponse {
        match self.send(request).await {
            Ok(response) => {
                debug!(status = response.status, "Response received");
                response
            }
            Err(e) => {
                warn!(error = %e, "Request failed");
                HttpResponse::transport_failure(e.to_string())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
