use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    /// Total HTTP requests by method, route pattern and status.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests segmented by method, route and status",
        &["method", "route", "status"]
    )
    .expect("failed to register http_requests_total");

    /// Request latency by method and route pattern.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration segmented by method and route",
        &["method", "route"]
    )
    .expect("failed to register http_request_duration_seconds");
}

pub fn observe_request(method: &str, route: &str, status: u16, elapsed_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(elapsed_secs);
}
