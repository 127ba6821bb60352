use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use chrono::Utc;
use lms_db::repositories::video as video_repo;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{acknowledged, required_header, signature, signature_rejected};
use crate::{
    ApiState,
    error::ApiError,
    metrics::record_webhook_event,
    video::mux::Asset,
};

const PROVIDER: &str = "video";
const SIGNATURE_HEADER: &str = "mux-signature";

#[derive(Debug, Deserialize)]
struct VideoEvent {
    #[serde(rename = "type")]
    kind: String,
    data: Value,
}

pub(super) async fn handle(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let header = required_header(&headers, SIGNATURE_HEADER, PROVIDER)?;
    signature::verify_mux(&state.webhooks.video, header, &body, Utc::now().timestamp())
        .map_err(|e| signature_rejected(PROVIDER, e))?;

    let outcome = match serde_json::from_slice::<VideoEvent>(&body) {
        Ok(event) if event.kind == "video.asset.ready" => match asset_ready(&state, event.data).await {
            Ok(label) => label,
            Err(e) => {
                tracing::error!(error = %e, "failed to store ready asset");
                "error"
            }
        },
        Ok(event) => {
            tracing::debug!(kind = %event.kind, "ignoring video event");
            "ignored"
        }
        Err(e) => {
            tracing::warn!(error = %e, "unparseable video webhook");
            "malformed"
        }
    };

    record_webhook_event(PROVIDER, outcome);
    Ok(acknowledged())
}

/// The upload was created with the lesson id as passthrough.
async fn asset_ready(state: &ApiState, data: Value) -> Result<&'static str, ApiError> {
    let Ok(asset) = serde_json::from_value::<Asset>(data) else {
        tracing::warn!("video.asset.ready without asset payload");
        return Ok("malformed");
    };
    let Some(lesson_id) = asset
        .passthrough
        .as_deref()
        .and_then(|p| Uuid::parse_str(p.trim()).ok())
    else {
        tracing::warn!(asset_id = %asset.id, "ready asset has no lesson passthrough");
        return Ok("unresolved");
    };

    match video_repo::upsert_asset(&state.pool, lesson_id, &asset.id, asset.playback_id()).await {
        Ok(stored) => {
            tracing::info!(%lesson_id, asset_id = %stored.asset_id, "video asset ready");
            Ok("stored")
        }
        // Lesson deleted while the video was processing
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            tracing::warn!(%lesson_id, asset_id = %asset.id, "dropping asset for missing lesson");
            Ok("unresolved")
        }
        Err(e) => Err(e.into()),
    }
}
