//! Mock transport for testing
//!
//! Simulates the instrument without a network:
//! - Records every request for verification
//! - Replays scripted replies in order (status and JSON body, or a
//!   connection failure)
//! - Answers `200` with an empty body once the script runs out

use super::{Method, RawResponse, Transport};
use crate::error::{HarpiaError, HarpiaResult};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A request observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// HTTP verb.
    pub method: Method,
    /// Full request URL.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum MockReply {
    Response(RawResponse),
    ConnectionFailure(String),
}

/// Mock transport for testing
///
/// Clones share the same recording and reply script, so a test can keep one
/// handle while the connector owns another.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use harpia_daq::adapters::MockTransport;
/// use harpia_daq::connector::HarpiaConnector;
/// use harpia_daq::instrument::{Shutter, Shutters};
///
/// let mock = MockTransport::new();
/// let connector = HarpiaConnector::with_transport("http://localhost:20050/v1/", Arc::new(mock.clone()));
/// Shutters::new(connector).open(Shutter::Pump)?;
/// assert_eq!(mock.request_count(), 1);
/// # Ok::<(), harpia_daq::HarpiaError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    replies: Arc<Mutex<VecDeque<MockReply>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Create a mock with an empty reply script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply with the given status and JSON body.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push_raw(status, body.to_string().into_bytes());
    }

    /// Queue a reply with the given status and an empty body.
    pub fn push_status(&self, status: u16) {
        self.push_raw(status, Vec::new());
    }

    /// Queue a reply with the given status and raw body bytes.
    pub fn push_raw(&self, status: u16, body: Vec<u8>) {
        lock(&self.replies).push_back(MockReply::Response(RawResponse { status, body }));
    }

    /// Queue a connection failure.
    pub fn push_connection_failure(&self, reason: impl Into<String>) {
        lock(&self.replies).push_back(MockReply::ConnectionFailure(reason.into()));
    }

    /// All requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests seen so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// URLs of all requests seen so far.
    pub fn urls(&self) -> Vec<String> {
        lock(&self.requests).iter().map(|r| r.url.clone()).collect()
    }

    /// Forget recorded requests and pending replies.
    pub fn clear(&self) {
        lock(&self.requests).clear();
        lock(&self.replies).clear();
    }
}

impl Transport for MockTransport {
    fn send(&self, method: Method, url: &str, body: Option<&Value>) -> HarpiaResult<RawResponse> {
        lock(&self.requests).push(RecordedRequest {
            method,
            url: url.to_string(),
            body: body.cloned(),
        });

        match lock(&self.replies).pop_front() {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::ConnectionFailure(reason)) => Err(HarpiaError::Transport {
                url: url.to_string(),
                reason,
            }),
            None => Ok(RawResponse {
                status: 200,
                body: Vec::new(),
            }),
        }
    }
}
