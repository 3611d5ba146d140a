//! Loopback HTTP server for integration tests.
//!
//! An `axum` router on `127.0.0.1` answers every request with the next
//! scripted reply and hands the request back over a channel. The server runs
//! on its own multi-thread runtime so that blocking clients under test can
//! drive their own runtimes on the test thread.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Runtime;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct ServerState {
    replies: Mutex<VecDeque<(u16, String)>>,
    captured: Mutex<Sender<CapturedRequest>>,
}

async fn capture(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = CapturedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect(),
        body: body.to_vec(),
    };
    let _ = state.captured.lock().unwrap().send(request);

    let (status, body) = state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((500, r#"{"Message":"no reply scripted"}"#.to_string()));
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Running loopback server. Stops when dropped.
pub struct Loopback {
    /// `http://127.0.0.1:{port}`
    pub origin: String,
    requests: Receiver<CapturedRequest>,
    _runtime: Runtime,
}

impl Loopback {
    /// Serve `replies` (status, body) in order.
    pub fn serve(replies: Vec<(u16, &str)>) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("server runtime");

        let (tx, rx) = mpsc::channel();
        let state = Arc::new(ServerState {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(status, body)| (status, body.to_string()))
                    .collect(),
            ),
            captured: Mutex::new(tx),
        });
        let app = Router::new().fallback(capture).with_state(state);

        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .expect("bind loopback");
        let origin = format!("http://{}", listener.local_addr().expect("local addr"));
        runtime.spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            origin,
            requests: rx,
            _runtime: runtime,
        }
    }

    /// Base URL of the instrument API on this server.
    pub fn base_url(&self) -> String {
        format!("{}/v1/", self.origin)
    }

    /// Next captured request.
    pub fn next_request(&self) -> CapturedRequest {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("request captured")
    }
}

/// An origin nothing listens on.
pub fn closed_origin() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
