//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs::{self, File};
use std::path::Path;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use route_crawler::{Handler, Route};
use tower::ServiceExt;

/// Create empty files (and their directories) under `root`.
pub fn touch_all(root: &Path, files: &[&str]) {
    for relative in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }
}

/// A route whose only handler responds with `body`.
pub fn text_route(body: impl Into<String>) -> Route {
    Route::single(text_handler(body))
}

pub fn text_handler(body: impl Into<String>) -> Handler {
    let body = body.into();
    Handler::continuation(move |_req, res, _next| {
        res.send(body.clone());
    })
}

/// Send one request through `router` and return status and body text.
pub async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send_request(router, request).await
}

pub async fn send_request(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
