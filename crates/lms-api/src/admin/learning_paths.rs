use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use lms_db::{
    models::{LearningPath, LearningPathCourse},
    repositories::learning_path as path_repo,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{ApiState, auth::CurrentUser, error::ApiError, validation::validate_payload};

pub(super) fn routes() -> Router<ApiState> {
    Router::new()
        .route("/learning-paths", get(list_paths))
        .route("/admin/learning-paths", post(create_path))
        .route("/admin/learning-paths/{id}/courses", put(set_path_courses))
}

#[derive(Debug, Serialize)]
struct PathView {
    #[serde(flatten)]
    path: LearningPath,
    courses: Vec<LearningPathCourse>,
}

fn assemble(paths: Vec<LearningPath>, mut courses: Vec<LearningPathCourse>) -> Vec<PathView> {
    courses.sort_by_key(|c| c.position);
    paths
        .into_iter()
        .map(|path| PathView {
            courses: courses
                .iter()
                .filter(|c| c.path_id == path.id)
                .cloned()
                .collect(),
            path,
        })
        .collect()
}

async fn list_paths(State(state): State<ApiState>) -> Result<Json<Vec<PathView>>, ApiError> {
    let paths = path_repo::list(&state.pool).await?;
    let courses = path_repo::courses_for_paths(&state.pool).await?;
    Ok(Json(assemble(paths, courses)))
}

/// Reject duplicates before they hit the composite key.
fn check_course_ids(course_ids: &[Uuid]) -> Result<(), ApiError> {
    let mut seen = std::collections::HashSet::new();
    if course_ids.iter().all(|id| seen.insert(*id)) {
        Ok(())
    } else {
        Err(ApiError::Validation("Duplicate course in learning path".to_string()))
    }
}

fn unknown_course(err: sqlx::Error) -> ApiError {
    match err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            ApiError::Validation("Unknown course in learning path".to_string())
        }
        other => other.into(),
    }
}

#[derive(Debug, Deserialize, Validate)]
struct CreatePath {
    #[validate(length(min = 1, max = 255))]
    title: String,
    #[validate(length(max = 5000))]
    description: Option<String>,
    #[validate(url)]
    image_url: Option<String>,
    #[serde(default)]
    course_ids: Vec<Uuid>,
}

async fn create_path(
    State(state): State<ApiState>,
    admin: CurrentUser,
    Json(request): Json<CreatePath>,
) -> Result<(StatusCode, Json<LearningPath>), ApiError> {
    admin.require_admin()?;
    validate_payload(&request)?;
    check_course_ids(&request.course_ids)?;

    let mut tx = state.pool.begin().await?;
    let path = path_repo::create(
        &mut *tx,
        request.title.trim(),
        request.description.as_deref(),
        request.image_url.as_deref(),
        admin.id(),
    )
    .await?;
    path_repo::insert_courses(&mut *tx, path.id, &request.course_ids)
        .await
        .map_err(unknown_course)?;
    tx.commit().await?;

    tracing::info!(path_id = %path.id, courses = request.course_ids.len(), "learning path created");
    Ok((StatusCode::CREATED, Json(path)))
}

#[derive(Debug, Deserialize)]
struct PathCourses {
    course_ids: Vec<Uuid>,
}

/// Replace the ordered course list of a path.
async fn set_path_courses(
    State(state): State<ApiState>,
    admin: CurrentUser,
    Path(path_id): Path<Uuid>,
    Json(request): Json<PathCourses>,
) -> Result<Json<PathView>, ApiError> {
    admin.require_admin()?;
    check_course_ids(&request.course_ids)?;

    let mut tx = state.pool.begin().await?;
    let path = path_repo::find(&mut *tx, path_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Learning path not found".to_string()))?;
    path_repo::clear_courses(&mut *tx, path_id).await?;
    path_repo::insert_courses(&mut *tx, path_id, &request.course_ids)
        .await
        .map_err(unknown_course)?;
    tx.commit().await?;

    let courses = path_repo::courses_for_paths(&state.pool).await?;
    let view = assemble(vec![path], courses)
        .pop()
        .ok_or_else(|| ApiError::NotFound("Learning path not found".to_string()))?;
    Ok(Json(view))
}
