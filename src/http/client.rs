//! HTTP client for webhook testing
//!
//! Thin wrapper over reqwest that bounds each call with a single deadline
//! and classifies failures.

#![allow(dead_code)]

use reqwest::{Client, Method};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Connection refused to {url}: {reason}")]
    ConnectionRefused { url: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to create HTTP client: {0}")]
    Build(String),
}

/// HTTP client with a per-request deadline
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default timeout
    pub fn new() -> Result<Self, HttpError> {
        Self::builder().build()
    }

    /// Create client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        Self::builder().timeout(timeout).build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request, bounding connect, send and body read by the timeout
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {e}", request.url)))?;
        debug!("Sending {} request to {}", request.method, url);

        let start = Instant::now();
        match tokio::time::timeout(self.timeout, self.dispatch(url, request)).await {
            Ok(Ok(mut response)) => {
                response.duration_ms = start.elapsed().as_millis() as u64;
                debug!(
                    "Response: {} in {}ms",
                    response.status_code, response.duration_ms
                );
                Ok(response)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(HttpError::Timeout(self.timeout)),
        }
    }

    async fn dispatch(
        &self,
        url: reqwest::Url,
        request: HttpRequest,
    ) -> Result<HttpResponse, HttpError> {
        let url_text = url.to_string();
        let mut req_builder = self.client.request(request.method, url);

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout)
            } else if e.is_connect() {
                HttpError::ConnectionRefused {
                    url: url_text.clone(),
                    reason: e.to_string(),
                }
            } else {
                HttpError::RequestFailed(e.to_string())
            }
        })?;

        let status_code = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout)
            } else {
                HttpError::Body(e.to_string())
            }
        })?;

        Ok(HttpResponse {
            status_code,
            body,
            duration_ms: 0,
        })
    }
}

/// Builder for [`HttpClient`]
#[derive(Clone, Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    accept_invalid_certs: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accept self-signed certificates on the target
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<HttpClient, HttpError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(HttpClient {
            client,
            timeout: self.timeout,
        })
    }
}

/// HTTP request builder
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Self, HttpError> {
        let body =
            serde_json::to_vec(value).map_err(|e| HttpError::RequestFailed(e.to_string()))?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }
}

/// HTTP response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decode the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_str(&self.body).map_err(|e| HttpError::Body(e.to_string()))
    }
}
