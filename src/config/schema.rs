//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the route server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Route directory discovery.
    pub crawler: CrawlerConfig,

    /// Defaults applied to every route built with `RouteOptions::from_defaults`.
    pub routes: RouteDefaults,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Directory crawl conventions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Root of the routes directory.
    pub root: PathBuf,

    /// Extension (without the dot) a route file must carry.
    pub extension: String,

    /// Leading marker that turns a directory into a path parameter.
    pub param_marker: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("routes"),
            extension: "js".to_string(),
            param_marker: "$".to_string(),
        }
    }
}

/// Route-level defaults, supplied once at startup.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteDefaults {
    pub require_authentication: bool,

    pub wildcard: bool,

    pub cors: Option<CorsConfig>,

    /// Environment variable name -> value(s) that suppress the route.
    /// Checked in name order; the first match wins.
    pub suppress: BTreeMap<String, Disallowed>,
}

/// One disallowed value or a set of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Disallowed {
    One(String),
    Many(Vec<String>),
}

impl Disallowed {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Disallowed::One(v) => v == value,
            Disallowed::Many(values) => values.iter().any(|v| v == value),
        }
    }
}

impl From<&str> for Disallowed {
    fn from(value: &str) -> Self {
        Disallowed::One(value.to_string())
    }
}

impl From<Vec<&str>> for Disallowed {
    fn from(values: Vec<&str>) -> Self {
        Disallowed::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// CORS options handed to the CORS layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty or `"*"` allows any origin.
    pub origins: Vec<String>,

    /// Allowed methods. Empty mirrors the preflight request.
    pub methods: Vec<String>,

    /// Allowed request headers. Empty mirrors the preflight request.
    pub headers: Vec<String>,

    pub credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: vec!["*".to_string()],
            methods: vec![
                "GET".to_string(),
                "HEAD".to_string(),
                "PUT".to_string(),
                "PATCH".to_string(),
                "POST".to_string(),
                "DELETE".to_string(),
            ],
            headers: Vec::new(),
            credentials: false,
            max_age_secs: None,
        }
    }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.origins.is_empty() || self.origins.iter().any(|o| o == "*")
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive, used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Record request counters and histograms.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "route_crawler=info,tower_http=info".to_string(),
            metrics_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disallowed_forms() {
        let config: RouteDefaults = toml::from_str(
            r#"
            require_authentication = true

            [suppress]
            NODE_ENV = "production"
            STAGE = ["prod", "staging"]
            "#,
        )
        .unwrap();

        assert!(config.require_authentication);
        assert_eq!(config.suppress["NODE_ENV"], Disallowed::One("production".into()));
        assert!(config.suppress["STAGE"].contains("staging"));
        assert!(!config.suppress["STAGE"].contains("dev"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.crawler.extension, "js");
        assert_eq!(config.crawler.param_marker, "$");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.routes.cors.is_none());
    }
}
