//! HTTP transport for instance metadata requests.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, Response};
use tracing::trace;

use crate::error::ImdsError;

/// Default per-request timeout for metadata probes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Metadata service base URL (link-local address, never resolved via DNS).
pub const DEFAULT_BASE_URL: &str = "http://169.254.169.254";

/// Upper bound on a single response body. IMDS answers are tiny.
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// HTTP method used for a metadata request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpMethod {
    #[default]
    Get,
    Put,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Put => Method::PUT,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Put => write!(f, "PUT"),
        }
    }
}

/// Status code and full body of a metadata response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImdsResponse {
    pub status: u16,
    pub body: String,
}

impl ImdsResponse {
    /// Whether the service answered with exactly `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// HTTP client wrapper for metadata service requests.
#[derive(Debug, Clone)]
pub struct ImdsClient {
    inner: Client,
    base_url: String,
}

impl ImdsClient {
    /// Create a client targeting the well-known metadata address.
    pub fn new() -> Result<Self, ImdsError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str) -> Result<Self, ImdsError> {
        // Every probe gets its own connection, and proxies from the
        // environment must never see link-local traffic.
        let inner = Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()?;
        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one request bounded by `timeout`.
    ///
    /// The deadline covers connecting, sending, and reading the whole body.
    /// When it elapses the request future is dropped, which tears down the
    /// connection. Any failure is reported as an error; callers are not
    /// expected to tell timeouts apart from refused connections.
    pub async fn request(
        &self,
        path: &str,
        timeout: Duration,
        headers: &[(&str, &str)],
        method: HttpMethod,
    ) -> Result<ImdsResponse, ImdsError> {
        let url = format!("{}{}", self.base_url, path);
        trace!(%method, %url, ?timeout, "imds request");

        let mut builder = self.inner.request(method.into(), &url).timeout(timeout);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = read_body_limited(response, MAX_BODY_SIZE).await?;

        trace!(%method, %url, status, len = body.len(), "imds response");
        Ok(ImdsResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Read a response body, failing once it grows past `max_size`.
///
/// The `Content-Length` header is checked first so oversized answers are
/// rejected before any of the body is read.
async fn read_body_limited(mut response: Response, max_size: usize) -> Result<Vec<u8>, ImdsError> {
    if let Some(content_length) = response.content_length() {
        if content_length as usize > max_size {
            return Err(ImdsError::TooLarge(content_length as usize, max_size));
        }
    }

    let capacity = response
        .content_length()
        .map(|cl| (cl as usize).min(max_size))
        .unwrap_or(max_size.min(1024));
    let mut body = Vec::with_capacity(capacity);

    while let Some(chunk) = response.chunk().await? {
        let total = body.len().saturating_add(chunk.len());
        if total > max_size {
            return Err(ImdsError::TooLarge(total, max_size));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
