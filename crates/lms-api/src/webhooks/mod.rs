//! Signed callbacks from the payment gateway, identity provider and video
//! platform.
//!
//! Every handler reads the raw body so signatures are checked over the exact
//! bytes sent. Once a signature passes the provider always gets a 200; failures
//! after that point are logged and acknowledged.

mod identity;
mod payment;
pub mod signature;
mod video;

use axum::{
    Json, Router,
    http::HeaderMap,
    routing::post,
};
use serde_json::{Value, json};

use crate::{
    ApiState,
    error::ApiError,
    metrics::record_webhook_event,
    middleware::rate_limit::{WEBHOOK_BURST, WEBHOOK_PER_SECOND, with_rate_limit},
};
use signature::SignatureError;

pub use payment::course_id_from_metadata;

pub fn routes() -> Router<ApiState> {
    let webhook_routes = Router::new()
        .route("/webhooks/payments", post(payment::handle))
        .route("/webhooks/identity", post(identity::handle))
        .route("/webhooks/video", post(video::handle));

    with_rate_limit(webhook_routes, WEBHOOK_PER_SECOND, WEBHOOK_BURST)
}

/// Required signature header; absence is a malformed request.
fn required_header<'a>(
    headers: &'a HeaderMap,
    name: &str,
    provider: &'static str,
) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            record_webhook_event(provider, "missing_signature");
            ApiError::Validation(format!("Missing {name} header"))
        })
}

fn signature_rejected(provider: &'static str, err: SignatureError) -> ApiError {
    tracing::warn!(provider, error = %err, "webhook signature rejected");
    record_webhook_event(provider, "invalid_signature");
    ApiError::Unauthenticated("Invalid webhook signature".to_string())
}

fn acknowledged() -> Json<Value> {
    Json(json!({ "received": true }))
}
