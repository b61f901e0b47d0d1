//! Request context seen by route handlers.
//!
//! # Responsibilities
//! - Carry method, path, headers, params, query and body in one value
//! - Decode query strings and bodies from the HTTP request
//! - Pick up authentication state set by upstream middleware
//!
//! # Design Decisions
//! - Query and body are JSON values so direct invocation can pass arbitrary args
//! - Upstream layers signal authentication through request extensions
//!   (`Authenticated`, `Principal`), never through headers parsed here

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RouteError;
use crate::routing::matcher::Params;

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Principal {
    pub id: String,

    #[serde(default)]
    pub claims: Value,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            claims: Value::Null,
        }
    }
}

/// Extension marker inserted by session middleware once a request is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated;

#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub params: Params,
    pub query: Value,
    pub body: Value,
    pub authenticated: bool,
    pub user: Option<Principal>,
}

impl Default for RouteRequest {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl RouteRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            params: Params::new(),
            query: Value::Object(Map::new()),
            body: Value::Null,
            authenticated: false,
            user: None,
        }
    }

    /// Mark the request authenticated as `user`.
    pub fn with_user(mut self, user: Principal) -> Self {
        self.authenticated = true;
        self.user = Some(user);
        self
    }

    /// Build a request context from an incoming HTTP request.
    pub async fn from_http(request: Request<Body>, max_body_bytes: usize) -> Result<Self, RouteError> {
        let (parts, body) = request.into_parts();

        let user = parts.extensions.get::<Principal>().cloned();
        let authenticated = user.is_some() || parts.extensions.get::<Authenticated>().is_some();

        let bytes = axum::body::to_bytes(body, max_body_bytes)
            .await
            .map_err(|_| RouteError::status(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"))?;

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let body = if bytes.is_empty() {
            Value::Null
        } else if content_type.contains("json") {
            serde_json::from_slice(&bytes)
                .map_err(|_| RouteError::status(StatusCode::BAD_REQUEST, "Malformed JSON body"))?
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            decode_form(&bytes)
        } else {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        };

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: decode_form(parts.uri.query().unwrap_or_default().as_bytes()),
            headers: parts.headers,
            params: Params::new(),
            body,
            authenticated,
            user,
        })
    }

    /// Helper to read a captured path param.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Decode `a=1&b=2&b=3` into `{"a": "1", "b": ["2", "3"]}`.
fn decode_form(input: &[u8]) -> Value {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(map)
}
