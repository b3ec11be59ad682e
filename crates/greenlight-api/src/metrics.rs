//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use greenlight_models::{CountSummary, VehicleClass};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "greenlight_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "greenlight_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "greenlight_http_requests_in_flight";

    // Upload workflow metrics
    pub const UPLOADS_TOTAL: &str = "greenlight_uploads_total";
    pub const DETECTION_DURATION_SECONDS: &str = "greenlight_detection_duration_seconds";
    pub const VEHICLES_DETECTED_TOTAL: &str = "greenlight_vehicles_detected_total";
    pub const GREEN_TIME_SECONDS: &str = "greenlight_green_time_seconds";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an upload by outcome ("analyzed", "rejected", "failed").
pub fn record_upload(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::UPLOADS_TOTAL, &labels).increment(1);
}

/// Record one analyzed image.
pub fn record_analysis(counts: &CountSummary, green_time: u32, detection_secs: f64) {
    histogram!(names::DETECTION_DURATION_SECONDS).record(detection_secs);
    for class in VehicleClass::ALL {
        let labels = [("class", class.as_str().to_string())];
        counter!(names::VEHICLES_DETECTED_TOTAL, &labels).increment(u64::from(counts.get(*class)));
    }
    gauge!(names::GREEN_TIME_SECONDS).set(f64::from(green_time));
}

/// Collapse per-file paths so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    static FILE_PATH: OnceLock<Regex> = OnceLock::new();
    let re = FILE_PATH
        .get_or_init(|| Regex::new(r"^/(uploads|results)/.+$").expect("valid path regex"));
    re.replace(path, "/$1/:filename").into_owned()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
