//! HTTP request plumbing shared by the API layers
//!
//! [`ApiRequest`] captures an outbound call in replayable form: the pipeline
//! re-executes the same owned value after a token refresh, and the explicit
//! `retried` flag bounds every call to one refresh-and-replay cycle.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;

/// An outbound API call captured for dispatch and possible replay
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the backend base URL, starting with `/`
    pub path: String,
    headers: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    /// Whether this call has already been through a refresh-and-replay cycle
    pub(crate) retried: bool,
}

impl ApiRequest {
    /// Create a new request
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
            retried: false,
        }
    }

    /// Create a GET request
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Create a POST request
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Create a PUT request
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// Create a DELETE request
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set or replace the bearer authorization header
    pub fn bearer_auth(mut self, token: &str) -> Self {
        self.set_bearer(token);
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub(crate) fn set_bearer(&mut self, token: &str) {
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
        self.headers
            .push(("Authorization".to_string(), format!("Bearer {}", token)));
    }

    pub(crate) fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub(crate) fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// A raw response from the transport
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl ApiResponse {
    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Extract the backend-provided error message, falling back to a generic
    /// one when the body carries none
    pub fn error_message(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|msg| msg.as_str())
                    .map(|msg| msg.to_string())
            })
            .unwrap_or_else(|| "The request could not be completed".to_string())
    }
}

/// Transport boundary between the pipeline and the HTTP stack
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute the request and return the raw response.
    ///
    /// Non-2xx statuses are returned as responses, not errors; only
    /// transport-level failures produce `Err`.
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, Error>;
}

/// Default transport backed by a shared reqwest client
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a new transport for the given backend base URL
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut req = self.client.request(request.method.clone(), &url);
        for (name, value) in request.headers() {
            req = req.header(name, value);
        }
        if let Some(body) = request.body() {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
