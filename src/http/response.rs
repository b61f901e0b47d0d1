//! Response capability handed to handlers.
//!
//! # Responsibilities
//! - Record status, headers and a single produced result
//! - Let the dispatcher wait for the result without polling
//! - Render the result as an HTTP response
//!
//! # Design Decisions
//! - One handle type serves both transport and direct invocation; nothing is patched at runtime
//! - First `send` wins; later calls are ignored
//! - Strings render as `text/plain`, `null` as an empty body, everything else as JSON

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
};
use serde_json::Value;
use tokio::sync::watch;

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Value>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<ResponseState>,
    sent: watch::Sender<bool>,
}

/// Cloneable response handle. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Response {
    shared: Arc<Shared>,
}

impl Response {
    pub fn new() -> Self {
        let (sent, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ResponseState {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: None,
                }),
                sent,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ResponseState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the status code used when the response is rendered.
    pub fn status(&self, status: StatusCode) -> &Self {
        self.state().status = status;
        self
    }

    /// Insert a header, replacing any previous value.
    pub fn header(&self, name: HeaderName, value: HeaderValue) -> &Self {
        self.state().headers.insert(name, value);
        self
    }

    /// Append every header from `headers`.
    pub fn merge_headers(&self, headers: &HeaderMap) {
        let mut state = self.state();
        for (name, value) in headers {
            state.headers.append(name.clone(), value.clone());
        }
    }

    /// Produce the result. Returns `false` if a result was already produced.
    pub fn send(&self, body: impl Into<Value>) -> bool {
        {
            let mut state = self.state();
            if state.body.is_some() {
                return false;
            }
            state.body = Some(body.into());
        }
        self.shared.sent.send_replace(true);
        true
    }

    pub fn is_sent(&self) -> bool {
        *self.shared.sent.borrow()
    }

    /// Resolves once `send` has been called.
    pub async fn sent(&self) {
        let mut rx = self.shared.sent.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|sent| *sent).await;
    }

    pub fn status_code(&self) -> StatusCode {
        self.state().status
    }

    /// The produced result, if any.
    pub fn body(&self) -> Option<Value> {
        self.state().body.clone()
    }

    /// Render into an HTTP response.
    pub fn into_http(self) -> axum::response::Response {
        let (status, mut headers, body) = {
            let mut state = self.state();
            (
                state.status,
                std::mem::take(&mut state.headers),
                state.body.take(),
            )
        };

        let body = match body {
            None | Some(Value::Null) => Body::empty(),
            Some(Value::String(text)) => {
                headers
                    .entry(header::CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("text/plain; charset=utf-8"));
                Body::from(text)
            }
            Some(value) => {
                headers
                    .entry(header::CONTENT_TYPE)
                    .or_insert(HeaderValue::from_static("application/json"));
                Body::from(value.to_string())
            }
        };

        (status, headers, body).into_response()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
