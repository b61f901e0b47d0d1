//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! crawler / dispatcher / handlers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Metrics are cheap and recorder-agnostic

pub mod logging;
pub mod metrics;

use crate::config::schema::ObservabilityConfig;

/// Install logging from `config`.
pub fn init(config: &ObservabilityConfig) -> Result<(), logging::TryInitError> {
    logging::init(&config.log_level)?;
    tracing::info!(
        filter = %config.log_level,
        metrics = config.metrics_enabled,
        "Observability initialized"
    );
    Ok(())
}
