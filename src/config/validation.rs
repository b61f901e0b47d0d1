//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Reject CORS settings the CORS layer cannot honour
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{AppConfig, CorsConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("crawler.extension must not be empty")]
    EmptyExtension,

    #[error("crawler.param_marker must not be empty")]
    EmptyParamMarker,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("{0}: credentials cannot be combined with a wildcard origin")]
    CorsCredentialsWithWildcard(String),

    #[error("{field}: invalid value '{value}'")]
    InvalidCorsValue { field: String, value: String },
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.crawler.extension.trim_start_matches('.').is_empty() {
        errors.push(ValidationError::EmptyExtension);
    }
    if config.crawler.param_marker.is_empty() {
        errors.push(ValidationError::EmptyParamMarker);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if let Some(cors) = &config.routes.cors {
        errors.extend(validate_cors("routes.cors", cors));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks a CORS block; also used when a route carries its own CORS options.
pub fn validate_cors(field: &str, cors: &CorsConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if cors.credentials && cors.allows_any_origin() {
        errors.push(ValidationError::CorsCredentialsWithWildcard(field.to_string()));
    }
    for origin in cors.origins.iter().filter(|o| o.as_str() != "*") {
        if axum::http::HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::InvalidCorsValue {
                field: format!("{field}.origins"),
                value: origin.clone(),
            });
        }
    }
    for method in &cors.methods {
        if axum::http::Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidCorsValue {
                field: format!("{field}.methods"),
                value: method.clone(),
            });
        }
    }
    for header in &cors.headers {
        if axum::http::HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidCorsValue {
                field: format!("{field}.headers"),
                value: header.clone(),
            });
        }
    }

    errors
}
