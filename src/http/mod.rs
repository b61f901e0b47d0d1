//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers)
//!     → dispatch.rs (registrations in crawl order)
//!     → request.rs (RouteRequest: params, query, body, auth state)
//!     → route handlers
//!     → response.rs (render the produced result)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::{Dispatcher, Registration};
pub use request::{Authenticated, Principal, RouteRequest};
pub use response::Response;
pub use server::HttpServer;
