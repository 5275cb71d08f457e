// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec,
    Encoder, HistogramVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    /// Registry owned by the client library
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Requests that reached the transport
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("github_requests_total", "Total GitHub API requests sent upstream"),
        &["method", "status_code"],
        REGISTRY
    ).unwrap();

    /// Upstream round-trip duration
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("github_request_duration_seconds", "GitHub API request duration in seconds")
            .buckets(vec![0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// Response cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("response_cache_operations_total", "Total response cache operations"),
        &["operation"], // operation: hit, miss, store
        REGISTRY
    ).unwrap();

    // ============================================================================
    // PAGINATION METRICS
    // ============================================================================

    /// Follow-up pages fetched through `next` links
    pub static ref PAGES_FOLLOWED: CounterVec = register_counter_vec_with_registry!(
        Opts::new("pagination_pages_followed_total", "Total follow-up pages fetched"),
        &["status"], // status: ok, failed
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
