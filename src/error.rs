//! Error taxonomy.
//!
//! # Design Decisions
//! - Crawl-time faults abort startup (`CrawlError`), never a partial route table
//! - Composition faults (`RouteError::Content`) surface when a chain is built
//! - Request-time faults travel through the continuation and render as responses

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Boxed error produced by application handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while composing or running a route's handler chain.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Authenticated request with no principal attached.
    #[error("permissions error: {0}")]
    Permissions(String),

    /// A handler was supplied in a shape that cannot be composed.
    #[error("content error: {0}")]
    Content(String),

    /// Handler-chosen HTTP status.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    /// Anything an application handler failed with.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),
}

impl RouteError {
    /// Wrap an arbitrary handler failure.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        RouteError::Handler(err.into())
    }

    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        RouteError::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status used when the error reaches the transport.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RouteError::Permissions(_) => StatusCode::FORBIDDEN,
            RouteError::Content(_) | RouteError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RouteError::Status { status, .. } => *status,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::Permissions(_) => "permissions",
            RouteError::Content(_) => "content",
            RouteError::Status { .. } => "status",
            RouteError::Handler(_) => "handler",
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details stay in the logs.
        let body = match &self {
            RouteError::Status { message, .. } => message.clone(),
            RouteError::Permissions(_) => "Forbidden".to_string(),
            _ => "Internal Server Error".to_string(),
        };
        (status, body).into_response()
    }
}

/// Errors that abort a directory crawl.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file matched the naming convention but no route was provided for it.
    #[error("Route instance is not exported from {}", path.display())]
    MissingRoute { path: PathBuf },

    #[error("failed to compose route at {}: {source}", path.display())]
    Compose {
        path: PathBuf,
        #[source]
        source: RouteError,
    },
}
