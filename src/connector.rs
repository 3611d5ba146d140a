//! Device connector: the single request primitive every device operation uses.
//!
//! `HarpiaConnector::call` checks the verb/body contract, joins the base URL
//! with the request path, hands the request to a [`Transport`] and classifies
//! the outcome. Device controllers go through the typed `get`/`put`/`post`
//! helpers, which cannot express an illegal verb/body combination, so
//! [`HarpiaConnector::call`] remains the only place where failures are
//! classified.

use crate::adapters::{HttpTransport, Method, Transport};
use crate::config::InstrumentConfig;
use crate::error::{HarpiaError, HarpiaResult};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Base URL of the instrument service when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:20050/v1/";

/// Stateless connector to the instrument HTTP API.
///
/// The base URL is fixed at construction. Cloning is cheap and clones share
/// the transport.
#[derive(Clone)]
pub struct HarpiaConnector {
    base_url: Arc<str>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for HarpiaConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarpiaConnector")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HarpiaConnector {
    /// Connect to `base_url` over HTTP with default transport settings.
    pub fn new(base_url: impl Into<String>) -> HarpiaResult<Self> {
        Ok(Self::with_transport(base_url, Arc::new(HttpTransport::new()?)))
    }

    /// Connect to `base_url` through the given transport.
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: Arc::from(base_url),
            transport,
        }
    }

    /// Connect using the `[instrument]` configuration section.
    pub fn from_config(config: &InstrumentConfig) -> HarpiaResult<Self> {
        let transport = HttpTransport::builder()
            .with_optional_timeout(config.timeout_ms.map(Duration::from_millis))
            .build()?;
        Ok(Self::with_transport(config.base_url.clone(), Arc::new(transport)))
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for `path`, with exactly one `/` between base and path.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Issue one request and decode its JSON response.
    ///
    /// # Errors
    ///
    /// Precondition faults are returned before the transport is used:
    /// - `EmptyPath` if `path` is empty
    /// - `GetWithBody` for a GET with a body
    /// - `PutWithoutBody` for a PUT without a body
    ///
    /// A non-2xx status yields `DeviceApi` carrying `error_message` verbatim,
    /// or `"Request to {path} failed with status code {status}"` when no
    /// message is supplied.
    pub fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        error_message: Option<&str>,
    ) -> HarpiaResult<Value> {
        if path.is_empty() {
            return Err(HarpiaError::EmptyPath);
        }
        match (method, body) {
            (Method::Get, Some(_)) => {
                return Err(HarpiaError::GetWithBody {
                    path: path.to_string(),
                })
            }
            (Method::Put, None) => {
                return Err(HarpiaError::PutWithoutBody {
                    path: path.to_string(),
                })
            }
            _ => {}
        }

        let url = self.endpoint_url(path);
        debug!(%method, url = %url, has_body = body.is_some(), "Instrument request");

        let response = self.transport.send(method, &url, body)?;

        if !response.is_success() {
            let message = match error_message {
                Some(message) => message.to_string(),
                None => format!(
                    "Request to {} failed with status code {}",
                    path, response.status
                ),
            };
            warn!(%method, path, status = response.status, "{}", message);
            return Err(HarpiaError::DeviceApi {
                message,
                path: path.to_string(),
                status: response.status,
            });
        }

        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&response.body).map_err(|source| HarpiaError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// GET `path`.
    pub(crate) fn get(&self, path: &str, error_message: Option<&str>) -> HarpiaResult<Value> {
        self.call(Method::Get, path, None, error_message)
    }

    /// PUT `body` to `path`.
    pub(crate) fn put(
        &self,
        path: &str,
        body: &Value,
        error_message: Option<&str>,
    ) -> HarpiaResult<Value> {
        self.call(Method::Put, path, Some(body), error_message)
    }

    /// POST to `path`, with or without a body.
    pub(crate) fn post(
        &self,
        path: &str,
        body: Option<&Value>,
        error_message: Option<&str>,
    ) -> HarpiaResult<Value> {
        self.call(Method::Post, path, body, error_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockTransport;
    use serde_json::json;

    fn connector(base: &str) -> (HarpiaConnector, MockTransport) {
        let mock = MockTransport::new();
        let connector = HarpiaConnector::with_transport(base, Arc::new(mock.clone()));
        (connector, mock)
    }

    #[test]
    fn test_endpoint_url_normalizes_separator() {
        for base in [
            "http://localhost:20050/v1",
            "http://localhost:20050/v1/",
            "http://localhost:20050/v1//",
        ] {
            let (c, _) = connector(base);
            for path in ["Basic/X", "/Basic/X", "//Basic/X"] {
                assert_eq!(c.endpoint_url(path), "http://localhost:20050/v1/Basic/X");
            }
        }
    }

    #[test]
    fn test_get_with_body_faults_before_io() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        let err = c
            .call(Method::Get, "Basic/X", Some(&json!(1)), None)
            .unwrap_err();
        assert!(matches!(err, HarpiaError::GetWithBody { .. }));
        assert!(err.is_precondition());
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_put_without_body_faults_before_io() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        let err = c.call(Method::Put, "Basic/X", None, None).unwrap_err();
        assert!(matches!(err, HarpiaError::PutWithoutBody { .. }));
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_empty_path_faults_before_io() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        let err = c.call(Method::Post, "", None, None).unwrap_err();
        assert!(matches!(err, HarpiaError::EmptyPath));
        assert_eq!(mock.request_count(), 0);
    }

    #[test]
    fn test_post_accepts_both_body_forms() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        c.call(Method::Post, "A", None, None).unwrap();
        c.call(Method::Post, "B", Some(&json!({"x": 1})), None)
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].body, None);
        assert_eq!(requests[1].body, Some(json!({"x": 1})));
    }

    #[test]
    fn test_success_returns_decoded_json() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        mock.push_json(200, json!({"Values": [1.0, 2.0]}));
        let value = c.call(Method::Get, "Basic/X", None, None).unwrap();
        assert_eq!(value, json!({"Values": [1.0, 2.0]}));
    }

    #[test]
    fn test_empty_success_body_is_null() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        mock.push_status(204);
        assert_eq!(c.call(Method::Post, "A", None, None).unwrap(), Value::Null);
    }

    #[test]
    fn test_undecodable_success_body() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        mock.push_raw(200, b"<html>".to_vec());
        let err = c.call(Method::Get, "Basic/X", None, None).unwrap_err();
        assert!(matches!(err, HarpiaError::Decode { .. }));
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_synthesized_message_contains_path_and_status() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        mock.push_status(503);
        let err = c.call(Method::Get, "Basic/X", None, None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Basic/X"));
        assert!(message.contains("503"));
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_override_message_used_verbatim() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        mock.push_json(400, json!({"Message": "bad"}));
        let err = c
            .call(Method::Post, "A", None, Some("Failed to do the thing"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to do the thing");
    }

    #[test]
    fn test_single_request_per_call() {
        let (c, mock) = connector(DEFAULT_BASE_URL);
        mock.push_status(500);
        let _ = c.call(Method::Get, "Basic/X", None, None);
        assert_eq!(mock.request_count(), 1);
    }
}
