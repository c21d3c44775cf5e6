//! # Service Client
//!
//! One authenticated JSON call to the partner service.
//!
//! ## Request Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ServiceClient { method, url, token }                                   │
//! │       │                                                                 │
//! │       │ call(body)                                                      │
//! │       ▼                                                                 │
//! │  <METHOD> <url>                                                        │
//! │  Accept: application/json                                              │
//! │  Authorization: Bearer <token>                                         │
//! │  [JSON body]                                                           │
//! │       │                                                                 │
//! │       ├── response ──► Ok(ServiceResponse { status, content })         │
//! │       └── no response ─► Err(SyncError::Transport)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any status is a successful call. Callers decide what each status means.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{SyncError, SyncResult};

/// HTTP verbs the partner integration uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Patch => write!(f, "PATCH"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Builds the shared reqwest client used for every partner call.
pub fn build_http_client(timeout: Duration) -> SyncResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SyncError::Internal(format!("Failed to build HTTP client: {}", e)))
}

// =============================================================================
// Client
// =============================================================================

/// A single bearer-authenticated call, bound to one URL and verb.
///
/// The token is captured at construction. A refresh that lands while the
/// call is in flight does not affect it.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    method: HttpMethod,
    url: String,
    token: String,
}

impl ServiceClient {
    pub fn new(
        http: reqwest::Client,
        method: HttpMethod,
        url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            method,
            url: url.into(),
            token: token.into(),
        }
    }

    /// Sends the request, with `body` as JSON when given.
    pub async fn call(&self, body: Option<&Value>) -> SyncResult<ServiceResponse> {
        let request = match self.method {
            HttpMethod::Get => self.http.get(&self.url),
            HttpMethod::Post => self.http.post(&self.url),
            HttpMethod::Patch => self.http.patch(&self.url),
            HttpMethod::Delete => self.http.delete(&self.url),
        };

        let mut request = request
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content = response.text().await?;

        debug!(method = %self.method, url = %self.url, status, "Partner call complete");

        Ok(ServiceResponse { status, content })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

// =============================================================================
// Response
// =============================================================================

/// Status and body of a partner response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    status: u16,
    content: String,
}

impl ServiceResponse {
    /// Builds a response directly; used by non-HTTP `PartnerApi` impls.
    pub fn new(status: u16, content: impl Into<String>) -> Self {
        Self {
            status,
            content: content.into(),
        }
    }

    /// Builds a response whose body is `value` serialized as JSON.
    pub fn json_body(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The raw response body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> SyncResult<T> {
        serde_json::from_str(&self.content).map_err(|e| SyncError::InvalidResponse(e.to_string()))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
