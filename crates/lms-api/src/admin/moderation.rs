use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use lms_db::{
    models::{ApprovalStatus, Course, User, UserRole, UserStatus},
    repositories::{catalog as catalog_repo, user as user_repo},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, auth::CurrentUser, error::ApiError};

pub(super) fn routes() -> Router<ApiState> {
    Router::new()
        .route("/admin/tutors", get(list_tutors))
        .route("/admin/users/{id}/status", put(set_user_status))
        .route("/admin/courses/{id}/approval", put(set_course_approval))
}

#[derive(Debug, Deserialize)]
struct TutorFilter {
    status: Option<UserStatus>,
}

async fn list_tutors(
    State(state): State<ApiState>,
    admin: CurrentUser,
    Query(filter): Query<TutorFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    admin.require_admin()?;
    Ok(Json(
        user_repo::list_by_role(&state.pool, UserRole::Tutor, filter.status).await?,
    ))
}

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: UserStatus,
}

/// Approve, reject, suspend or ban an account.
async fn set_user_status(
    State(state): State<ApiState>,
    admin: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> Result<Json<User>, ApiError> {
    admin.require_admin()?;
    if user_id == admin.id() {
        return Err(ApiError::Validation("Admins cannot change their own status".to_string()));
    }

    let user = user_repo::set_status(&state.pool, user_id, change.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(admin_id = %admin.id(), %user_id, status = ?change.status, "user status changed");
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
struct ApprovalChange {
    status: ApprovalStatus,
}

async fn set_course_approval(
    State(state): State<ApiState>,
    admin: CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(change): Json<ApprovalChange>,
) -> Result<Json<Course>, ApiError> {
    admin.require_admin()?;

    let course = catalog_repo::set_approval(&state.pool, course_id, change.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    tracing::info!(admin_id = %admin.id(), %course_id, status = ?change.status, "course approval changed");
    Ok(Json(course))
}
