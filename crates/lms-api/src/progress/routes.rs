use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use lms_db::{
    models::{AwardKind, LessonContext, LessonProgress},
    repositories::{catalog as catalog_repo, progress as progress_repo},
};
use lms_engine::Completion;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ApiState,
    auth::CurrentUser,
    completion::{compute_completion, course_completion},
    entitlement::ensure_lesson_access,
    error::ApiError,
    gamification::{LESSON_POINTS, award_once},
    middleware::rate_limit::{WRITE_BURST, WRITE_PER_SECOND, with_rate_limit},
};

pub fn routes() -> Router<ApiState> {
    let progress_routes = Router::new()
        .route("/lessons/{id}/access", post(record_access))
        .route("/courses/{id}/progress", get(get_progress).put(update_progress))
        .route("/courses/{id}/completion", get(get_completion));

    with_rate_limit(progress_routes, WRITE_PER_SECOND, WRITE_BURST)
}

async fn lesson(state: &ApiState, lesson_id: Uuid) -> Result<LessonContext, ApiError> {
    catalog_repo::find_lesson_context(&state.pool, lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))
}

async fn ensure_course_exists(state: &ApiState, course_id: Uuid) -> Result<(), ApiError> {
    catalog_repo::find_course(&state.pool, course_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

/// Stamp that the learner opened a lesson. Completion is left untouched.
async fn record_access(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<LessonProgress>, ApiError> {
    let lesson = lesson(&state, lesson_id).await?;
    ensure_lesson_access(&state.pool, Some(&learner), &lesson).await?;

    let progress = progress_repo::record_access(&state.pool, learner.id, lesson_id).await?;
    Ok(Json(progress))
}

#[derive(Debug, Deserialize)]
struct ProgressUpdate {
    lesson_id: Uuid,
    is_completed: bool,
}

#[derive(Debug, Serialize)]
struct ProgressUpdateResponse {
    progress: LessonProgress,
    completion: Completion,
    points_awarded: i64,
}

async fn update_progress(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<ProgressUpdateResponse>, ApiError> {
    let lesson = lesson(&state, update.lesson_id).await?;
    if lesson.course_id != course_id {
        return Err(ApiError::NotFound("Lesson not found in this course".to_string()));
    }
    ensure_lesson_access(&state.pool, Some(&learner), &lesson).await?;

    let mut tx = state.pool.begin().await?;
    let progress =
        progress_repo::set_completed(&mut *tx, learner.id, update.lesson_id, update.is_completed)
            .await?;

    let points_awarded = if update.is_completed {
        award_once(
            &mut tx,
            learner.id,
            update.lesson_id,
            AwardKind::LessonCompleted,
            LESSON_POINTS,
        )
        .await?
    } else {
        0
    };
    tx.commit().await?;

    let completion = course_completion(&state.pool, learner.id, course_id).await?;
    tracing::debug!(
        learner_id = %learner.id,
        lesson_id = %update.lesson_id,
        completed = completion.completed_count,
        total = completion.total_lessons,
        "progress updated"
    );

    Ok(Json(ProgressUpdateResponse {
        progress,
        completion,
        points_awarded,
    }))
}

#[derive(Debug, Serialize)]
struct CourseProgress {
    lessons: Vec<LessonProgress>,
    completion: Completion,
    percentage: i32,
}

async fn get_progress(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseProgress>, ApiError> {
    ensure_course_exists(&state, course_id).await?;

    let lesson_ids = catalog_repo::lesson_ids_for_course(&state.pool, course_id).await?;
    let lessons = progress_repo::list_for_lessons(&state.pool, learner.id, &lesson_ids).await?;
    let completion = compute_completion(&state.pool, learner.id, &lesson_ids).await?;

    Ok(Json(CourseProgress {
        lessons,
        percentage: completion.percentage(),
        completion,
    }))
}

async fn get_completion(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Completion>, ApiError> {
    ensure_course_exists(&state, course_id).await?;
    Ok(Json(course_completion(&state.pool, learner.id, course_id).await?))
}
