//! Prometheus metrics for monitoring API performance and business events.

use std::sync::LazyLock;
use std::time::Instant;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

static UUID_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}").ok()
});
static NUMBER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"/\d+").ok());

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        &[
            0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ],
    )?;

    let handle = builder.install_recorder()?;

    Ok(handle)
}

/// Middleware to record HTTP request metrics
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    gauge!("http_requests_in_flight", "method" => method.clone(), "path" => path.clone())
        .increment(1.0);

    let response: Response = next.run(req).await;

    gauge!("http_requests_in_flight", "method" => method.clone(), "path" => path.clone())
        .decrement(1.0);

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(duration);

    response
}

/// Replace UUIDs and numeric ids with placeholders to bound label cardinality
fn normalize_path(path: &str) -> String {
    let mut normalized = path.to_string();
    if let Some(re) = UUID_RE.as_ref() {
        normalized = re.replace_all(&normalized, ":id").to_string();
    }
    if let Some(re) = NUMBER_RE.as_ref() {
        normalized = re.replace_all(&normalized, "/:id").to_string();
    }
    normalized
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> impl IntoResponse {
    (StatusCode::OK, handle.render())
}

/// Record an enrollment attempt.
///
/// `path` is `verify`, `webhook` or `free`; `outcome` is `enrolled`,
/// `already_enrolled` or `rejected`.
pub fn record_enrollment(path: &'static str, outcome: &'static str) {
    counter!("enrollments_total", "path" => path, "outcome" => outcome).increment(1);
}

/// Record an inbound webhook delivery
pub fn record_webhook_event(provider: &'static str, outcome: &'static str) {
    counter!("webhook_events_total", "provider" => provider, "outcome" => outcome).increment(1);
}

/// Record email sending events
pub fn record_email_event(email_type: &str, success: bool) {
    let status = if success { "success" } else { "failure" };

    counter!(
        "email_events_total",
        "type" => email_type.to_string(),
        "status" => status
    )
    .increment(1);
}
