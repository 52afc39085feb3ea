//! HTTP transport seam.
//!
//! [`ApiClient`](crate::api::client::ApiClient) never talks to reqwest
//! directly: it hands a fully resolved [`HttpRequest`] to a [`Transport`].
//! Production code uses [`ReqwestTransport`]; tests plug in scripted
//! transports to drive the refresh protocol deterministically.

use crate::errors::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

/// A request ready to go on the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Bearer token for the `Authorization` header
    pub bearer: Option<String>,
}

/// Status and raw body of a received response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests and returns whatever the server answered.
///
/// Only failures where no response exists (connect errors, timeouts) are
/// errors; every HTTP status, including 4xx and 5xx, is a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Builds the underlying client with the timeout and JSON default headers.
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| ApiError::config(format!("HTTP client setup failed: {}", err)))?;

        Ok(Self {
            http_client,
            timeout,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let mut builder = self.http_client.request(request.method, &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            ApiError::network(match err {
                err if err.is_timeout() => {
                    format!("Request timed out after {} seconds", self.timeout.as_secs())
                }
                err if err.is_connect() => format!("Could not connect to {}", request.url),
                _ => format!("Request failed: {}", err),
            })
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| ApiError::network(format!("Failed to read response body: {}", err)))?;

        Ok(HttpResponse { status, body })
    }
}
