//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Discovery (at startup):
//!     routes directory
//!     → crawler.rs (walk, classify, load Route per file)
//!     → ordering.rs (sibling order, wildcard hoisting)
//!     → Route::register(verb, path) per file
//!     → ordered Vec<Registration>
//!
//! Incoming Request:
//!     → matcher.rs (method + path pattern, capture params)
//!     → first matching registration in crawl order
//! ```
//!
//! # Design Decisions
//! - Routes discovered once at startup, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same tree always yields the same order
//! - First match wins; the crawler orders most-specific first

pub mod crawler;
pub mod matcher;
pub mod ordering;
pub mod verb;

pub use crawler::{crawl, CrawledRoute, Crawler, RouteLoader, RouteTable};
pub use matcher::{MethodMatcher, Params, PathPattern};
pub use verb::Verb;
