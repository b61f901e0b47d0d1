//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → RouteDefaults threaded into every RouteOptions::from_defaults
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no global default registry
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::CorsConfig;
pub use schema::CrawlerConfig;
pub use schema::Disallowed;
pub use schema::RouteDefaults;
