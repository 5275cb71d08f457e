// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    REGISTRY,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
    CACHE_OPERATIONS,
    PAGES_FOLLOWED,
};

/// Helper to record a request that completed upstream
pub fn record_request(method: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[method, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[method])
        .observe(duration_secs);
}

/// Helpers to record response cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_store() {
    CACHE_OPERATIONS.with_label_values(&["store"]).inc();
}

/// Helper to record a followed pagination link
pub fn record_page_followed(success: bool) {
    let status = if success { "ok" } else { "failed" };
    PAGES_FOLLOWED.with_label_values(&[status]).inc();
}
