//! HTTP transport for the instrument API
//!
//! Wraps an async `reqwest::Client` behind a private current-thread Tokio
//! runtime so that every request blocks the caller until the instrument
//! answers. The instrument is a single serial device; there is no pooling,
//! retry or concurrency at this layer.

use super::{Method, RawResponse, Transport};
use crate::error::{HarpiaError, HarpiaResult};
use serde_json::Value;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::trace;

/// Build the runtime used to drive async HTTP clients from blocking code.
pub(crate) fn blocking_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Builder for constructing `HttpTransport` with custom configuration
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use harpia_daq::adapters::HttpTransport;
///
/// let transport = HttpTransport::builder()
///     .with_timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok::<(), harpia_daq::HarpiaError>(())
/// ```
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Set a per-request timeout.
    ///
    /// Default: none (reqwest's default applies).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set or clear the per-request timeout.
    pub fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Fails if the runtime or the HTTP client cannot be created.
    pub fn build(self) -> HarpiaResult<HttpTransport> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| HarpiaError::Transport {
            url: String::new(),
            reason: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(HttpTransport {
            client,
            runtime: blocking_runtime()?,
        })
    }
}

/// Blocking HTTP/JSON transport.
///
/// Must not be used from inside another Tokio runtime: `send` calls
/// `Runtime::block_on`.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpTransport {
    /// Create a transport with default settings.
    pub fn new() -> HarpiaResult<Self> {
        Self::builder().build()
    }

    /// Start building a transport with custom settings.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }
}

impl Transport for HttpTransport {
    fn send(&self, method: Method, url: &str, body: Option<&Value>) -> HarpiaResult<RawResponse> {
        let request = match method {
            Method::Get => self.client.get(url),
            Method::Put => self.client.put(url),
            Method::Post => self.client.post(url),
        };
        // `json` also sets Content-Type: application/json
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let transport_error = |e: reqwest::Error| HarpiaError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        self.runtime.block_on(async {
            let response = request.send().await.map_err(transport_error)?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(transport_error)?;
            trace!(%method, url, status, bytes = body.len(), "HTTP exchange complete");

            Ok(RawResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}
