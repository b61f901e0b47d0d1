//! Metrics collection.
//!
//! # Metrics
//! - `route_requests_total` (counter): dispatched requests by method, status
//! - `route_request_duration_seconds` (histogram): latency distribution by method
//! - `route_dispatch_errors_total` (counter): errors delivered through the continuation, by kind
//! - `route_registrations_total` (counter): layers produced by a crawl
//!
//! # Design Decisions
//! - Recording is a no-op until the application installs a recorder
//! - Labels stay low-cardinality (no paths)

use std::time::Instant;

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start_time: Instant) {
    let latency = start_time.elapsed().as_secs_f64();

    ::metrics::counter!(
        "route_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!(
        "route_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(latency);
}

/// Record an error that reached the error channel.
pub fn record_error(kind: &'static str) {
    ::metrics::counter!("route_dispatch_errors_total", "kind" => kind).increment(1);
}

/// Record the layers produced by a crawl.
pub fn record_registrations(count: usize) {
    ::metrics::counter!("route_registrations_total").increment(count as u64);
}
