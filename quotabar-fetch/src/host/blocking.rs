//! Minimal blocking transport backed by `ureq`.
//!
//! Used when the async client cannot be built, or when selected explicitly.
//! Requests run on tokio's blocking pool. Non-2xx statuses are returned as
//! responses, matching [`ReqwestTransport`](super::http::ReqwestTransport).

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use ureq::Agent;

use super::http::{
    HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, ResponseBody, USER_AGENT,
};
use crate::error::HttpError;

/// Blocking transport running on `spawn_blocking`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Creates a transport with the given per-call timeout.
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .user_agent(USER_AGENT)
            .build()
            .into();
        Self { agent }
    }

    fn send_blocking(agent: &Agent, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut response = match request.method {
            Method::Get => {
                let mut builder = agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            Method::Post => {
                let mut builder = agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(RequestBody::Json(body)) => builder.send_json(body)?,
                    Some(RequestBody::Form(pairs)) => builder
                        .send_form(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?,
                    None => builder.send_empty()?,
                }
            }
        };

        let status = response.status().as_u16();
        let bytes = response.body_mut().read_to_vec()?;
        Ok(HttpResponse {
            status,
            body: ResponseBody::decode(&bytes),
        })
    }
}

#[async_trait]
impl HttpTransport for UreqTransport {
    fn name(&self) -> &'static str {
        "ureq"
    }

    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    async fn request(&self, request: HttpRequest) -> HttpResponse {
        let agent = self.agent.clone();
        let result = tokio::task::spawn_blocking(move || Self::send_blocking(&agent, &request))
            .await
            .map_err(HttpError::from)
            .and_then(|inner| inner);

        match result {
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
