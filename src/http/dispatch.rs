//! Ordered registrations and the dispatcher that runs them.
//!
//! # Responsibilities
//! - Hold layers (method + path pattern + middleware chain) in registration order
//! - Run the first matching layer's chain, falling through on `next()`
//! - Render errors delivered through the continuation
//!
//! # Design Decisions
//! - Registration order is match order; specificity is the crawler's job
//! - A layer's params are captured per match, not shared across layers
//! - Nothing matched (or everything fell through) → 404

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response as HttpResponse},
    Router,
};

use crate::error::RouteError;
use crate::http::request::RouteRequest;
use crate::http::response::Response;
use crate::observability::metrics;
use crate::route::handler::{drive, Middleware, Step};
use crate::routing::matcher::{MethodMatcher, PathPattern};

/// One registered method/path with its middleware chain.
#[derive(Clone)]
pub struct Layer {
    method: MethodMatcher,
    pattern: PathPattern,
    chain: Vec<Middleware>,
}

impl Layer {
    pub fn method(&self) -> &MethodMatcher {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("chain", &self.chain.len())
            .finish()
    }
}

/// What a route hands back from `register`: an ordered set of layers.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    layers: Vec<Layer>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `chain` for `method` at `path`.
    pub fn on(&mut self, method: impl Into<MethodMatcher>, path: &str, chain: Vec<Middleware>) -> &mut Self {
        self.layers.push(Layer {
            method: method.into(),
            pattern: PathPattern::parse(path),
            chain,
        });
        self
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Runs requests through registrations in order.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    layers: Arc<Vec<Layer>>,
    max_body_bytes: usize,
    record_metrics: bool,
}

impl Dispatcher {
    pub fn new(registrations: impl IntoIterator<Item = Registration>) -> Self {
        let layers = registrations
            .into_iter()
            .flat_map(|r| r.layers)
            .collect::<Vec<_>>();
        Self {
            layers: Arc::new(layers),
            max_body_bytes: 2 * 1024 * 1024,
            record_metrics: true,
        }
    }

    pub fn with_body_limit(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.record_metrics = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Handle a raw HTTP request.
    pub async fn handle(&self, request: Request<Body>) -> HttpResponse {
        let start_time = Instant::now();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let response = match RouteRequest::from_http(request, self.max_body_bytes).await {
            Ok(req) => self.dispatch(req).await,
            Err(err) => {
                tracing::warn!(method = %method, path = %path, error = %err, "Rejected request");
                if self.record_metrics {
                    metrics::record_error(err.kind());
                }
                err.into_response()
            }
        };

        if self.record_metrics {
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
        }
        response
    }

    /// Run `req` through every matching layer until one completes it.
    pub async fn dispatch(&self, req: RouteRequest) -> HttpResponse {
        let res = Response::new();
        let method = req.method.clone();
        let path = req.path.clone();

        for layer in self.layers.iter() {
            if !layer.method.matches(&req.method) {
                continue;
            }
            let Some(params) = layer.pattern.matches(&req.path) else {
                continue;
            };

            tracing::trace!(method = %method, path = %path, pattern = layer.pattern.as_str(), "Layer matched");
            let scoped = Arc::new(RouteRequest {
                params,
                ..req.clone()
            });

            for middleware in &layer.chain {
                match drive(middleware, Arc::clone(&scoped), &res).await {
                    Step::Continue if !res.is_sent() => continue,
                    Step::Continue | Step::Done => return res.into_http(),
                    Step::Fail(err) => {
                        if err.status_code().is_server_error() {
                            tracing::error!(method = %method, path = %path, error = %err, "Route handler failed");
                        } else {
                            tracing::warn!(method = %method, path = %path, error = %err, "Route handler rejected request");
                        }
                        if self.record_metrics {
                            metrics::record_error(err.kind());
                        }
                        return err.into_response();
                    }
                }
            }
        }

        if res.is_sent() {
            return res.into_http();
        }

        tracing::debug!(method = %method, path = %path, "No route matched");
        (StatusCode::NOT_FOUND, format!("Cannot {method} {path}")).into_response()
    }

    /// An axum router that sends every request through this dispatcher.
    pub fn into_router(self) -> Router {
        Router::new().fallback(move |request: Request<Body>| {
            let dispatcher = self.clone();
            async move { dispatcher.handle(request).await }
        })
    }
}
