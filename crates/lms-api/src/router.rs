use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{
    ApiConfig, admin, analytics, catalog, engagement, enrollment, gamification, learner,
    metrics::track_metrics,
    middleware::{
        cors::create_cors_layer, request_id::request_id_middleware,
        security_headers::apply_security_headers,
    },
    progress, quiz,
    state::ApiState,
    video, webhooks,
};

/// Every API route. Rate limits are applied per route group.
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(webhooks::routes())
        .merge(catalog::routes())
        .merge(enrollment::routes())
        .merge(progress::routes())
        .merge(quiz::routes())
        .merge(learner::routes())
        .merge(engagement::routes())
        .merge(analytics::routes())
        .merge(video::routes())
        .merge(gamification::routes())
        .merge(admin::routes())
        .fallback(handler_404)
}

/// Wrap a stateful app in the cross-cutting HTTP layers shared by both
/// binaries: CORS, request tracing, metrics, request ids and security headers.
pub fn with_http_layers(app: Router, config: &ApiConfig) -> Router {
    let cors = create_cors_layer(config.parsed_allowed_origins());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let app = app
        .layer(cors)
        .layer(trace_layer)
        .layer(middleware::from_fn(track_metrics))
        .layer(middleware::from_fn(request_id_middleware));

    apply_security_headers(app, config.environment)
}

/// Liveness
async fn health() -> StatusCode {
    StatusCode::OK
}

/// Readiness: the database answers.
async fn readiness(State(state): State<ApiState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "The requested resource was not found" })),
    )
}
