//! Convention-based route discovery and composition.
//!
//! # Architecture Overview
//!
//! ```text
//!   routes/                      ┌──────────────────────────────┐
//!   ├── get.js        ──────────▶│ routing::Crawler              │
//!   ├── account/                 │  ordering (verb/order/wild)   │
//!   │   └── post-1.js            │  RouteLoader → Route          │
//!   └── $id/                     └──────────────┬───────────────┘
//!       └── get.js                              │ Route::register(verb, path)
//!                                               ▼
//!                                ┌──────────────────────────────┐
//!                                │ route                        │
//!                                │  cors → auth gate → adapter  │
//!                                └──────────────┬───────────────┘
//!                                               │ Vec<Registration>
//!                                               ▼
//!     Client Request  ─────────▶ ┌──────────────────────────────┐
//!                                │ http::Dispatcher (axum)       │
//!     Client Response ◀───────── │  first match, next() falls    │
//!                                │  through, errors rendered     │
//!                                └──────────────────────────────┘
//!
//!   Route::invoke_direct: same handler chain, no transport.
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod observability;
pub mod route;
pub mod routing;

pub use config::AppConfig;
pub use error::{CrawlError, RouteError};
pub use http::{Dispatcher, HttpServer, Registration, Response, RouteRequest};
pub use route::{Handler, Next, Route, RouteOptions};
pub use routing::{crawl, Crawler, RouteLoader, RouteTable, Verb};
