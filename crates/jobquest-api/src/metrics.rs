//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

use jobquest_models::ApplicationStatus;

use crate::cache::Lookup;

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "jobquest_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobquest_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobquest_http_requests_in_flight";

    // Identity
    pub const SIGNUPS_TOTAL: &str = "jobquest_signups_total";
    pub const LOGINS_TOTAL: &str = "jobquest_logins_total";
    pub const PASSWORD_RESETS_TOTAL: &str = "jobquest_password_resets_total";

    // Applications
    pub const APPLICATIONS_SUBMITTED_TOTAL: &str = "jobquest_applications_submitted_total";
    pub const APPLICATION_TRANSITIONS_TOTAL: &str = "jobquest_application_transitions_total";

    // Stats cache
    pub const STATS_CACHE_HITS_TOTAL: &str = "jobquest_stats_cache_hits_total";
    pub const STATS_CACHE_MISSES_TOTAL: &str = "jobquest_stats_cache_misses_total";
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

/// Record an account creation.
pub fn record_signup(role: &str) {
    let labels = [("role", role.to_string())];
    counter!(names::SIGNUPS_TOTAL, &labels).increment(1);
}

/// Record a login attempt, `outcome` is "success" or "failure".
pub fn record_login(outcome: &'static str) {
    counter!(names::LOGINS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_password_reset(outcome: &'static str) {
    counter!(names::PASSWORD_RESETS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a new application.
pub fn record_application_submitted() {
    counter!(names::APPLICATIONS_SUBMITTED_TOTAL).increment(1);
}

/// Record a status change, labelled by the new status.
pub fn record_status_transition(status: ApplicationStatus) {
    counter!(names::APPLICATION_TRANSITIONS_TOTAL, "status" => status.as_str()).increment(1);
}

/// Record a stats cache lookup.
pub fn record_stats_lookup(lookup: Lookup) {
    match lookup {
        Lookup::Hit => counter!(names::STATS_CACHE_HITS_TOTAL).increment(1),
        Lookup::Miss => counter!(names::STATS_CACHE_MISSES_TOTAL).increment(1),
    }
}

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("valid uuid regex")
});

static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").expect("valid numeric segment regex"));

static UPLOAD_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/uploads/.+$").expect("valid upload path regex"));

/// Sanitize path for metrics labels (collapse ids and file names).
fn sanitize_path(path: &str) -> String {
    if UPLOAD_PATH.is_match(path) {
        return "/uploads/:file".to_string();
    }
    // Application ids are two uuids joined by '_'
    let path = UUID_PATTERN.replace_all(path, ":id");
    let path = path.replace(":id_:id", ":id");
    NUMERIC_SEGMENT.replace_all(&path, "/:id$1").to_string()
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
