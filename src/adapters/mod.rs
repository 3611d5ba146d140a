//! Transport adapter implementations
//!
//! This module defines the `Transport` trait, the lowest layer of the stack:
//! one synchronous HTTP exchange per call. Adapters move bytes only; they
//! never interpret status codes. Classification happens in
//! [`crate::connector::HarpiaConnector`].

pub mod http_adapter;
pub mod mock;

pub use http_adapter::HttpTransport;
pub use mock::{MockTransport, RecordedRequest};

use crate::error::HarpiaResult;
use serde_json::Value;
use std::fmt;

/// HTTP verbs accepted by the instrument API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read-only request, never carries a body.
    Get,
    /// Update request, always carries a body.
    Put,
    /// Action request, body optional.
    Post,
}

impl Method {
    /// Upper-case verb as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status code and undecoded body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// True for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A blocking request/response channel to the instrument.
///
/// Implementations must issue exactly one outbound request per call and
/// must not retry.
pub trait Transport: Send + Sync {
    /// Perform a single request against `url`, sending `body` as JSON when present.
    fn send(&self, method: Method, url: &str, body: Option<&Value>) -> HarpiaResult<RawResponse>;
}
