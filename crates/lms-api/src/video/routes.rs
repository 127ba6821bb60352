use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use lms_db::{
    models::{LessonContext, LessonType},
    repositories::{catalog as catalog_repo, video as video_repo},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiState, auth::CurrentUser, error::ApiError};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/tutor/lessons/{id}/video-upload", post(create_upload))
        .route("/tutor/lessons/{id}/video-status", get(video_status))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    upload_id: String,
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct VideoStatusResponse {
    /// `no_upload`, `waiting`, `preparing`, `ready` or `errored`
    status: String,
    asset_id: Option<String>,
    playback_id: Option<String>,
}

impl VideoStatusResponse {
    fn pending(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            asset_id: None,
            playback_id: None,
        }
    }
}

async fn owned_video_lesson(
    state: &ApiState,
    user: &CurrentUser,
    lesson_id: Uuid,
) -> Result<LessonContext, ApiError> {
    user.require_author()?;
    let lesson = catalog_repo::find_lesson_context(&state.pool, lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;
    user.require_owner(lesson.tutor_id)?;

    if lesson.lesson_type != LessonType::Video {
        return Err(ApiError::Validation("Lesson is not a video lesson".to_string()));
    }
    Ok(lesson)
}

async fn create_upload(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<UploadResponse>, ApiError> {
    owned_video_lesson(&state, &user, lesson_id).await?;

    let upload = state.video.create_upload(lesson_id, &state.frontend_url).await?;
    video_repo::set_upload_id(&state.pool, lesson_id, &upload.id).await?;
    tracing::info!(%lesson_id, upload_id = %upload.id, "direct upload created");

    Ok(Json(UploadResponse {
        upload_id: upload.id,
        upload_url: upload.url,
    }))
}

/// Polling fallback for when the asset-ready webhook has not arrived.
async fn video_status(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<VideoStatusResponse>, ApiError> {
    let lesson = owned_video_lesson(&state, &user, lesson_id).await?;

    if let Some(asset) = video_repo::find_asset(&state.pool, lesson_id).await? {
        return Ok(Json(VideoStatusResponse {
            status: "ready".to_string(),
            asset_id: Some(asset.asset_id),
            playback_id: asset.playback_id,
        }));
    }

    let Some(upload_id) = lesson.video_upload_id else {
        return Ok(Json(VideoStatusResponse::pending("no_upload")));
    };

    let upload = state.video.get_upload(&upload_id).await?;
    let Some(asset_id) = upload.asset_id else {
        return Ok(Json(VideoStatusResponse::pending(upload.status)));
    };

    let asset = state.video.get_asset(&asset_id).await?;
    if !asset.is_ready() {
        let status = asset.status.unwrap_or_else(|| "preparing".to_string());
        return Ok(Json(VideoStatusResponse::pending(status)));
    }

    let stored =
        video_repo::upsert_asset(&state.pool, lesson_id, &asset.id, asset.playback_id()).await?;
    tracing::info!(%lesson_id, asset_id = %stored.asset_id, "video asset stored by polling");

    Ok(Json(VideoStatusResponse {
        status: "ready".to_string(),
        asset_id: Some(stored.asset_id),
        playback_id: stored.playback_id,
    }))
}
