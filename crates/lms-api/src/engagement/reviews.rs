use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use lms_db::{
    models::{Course, RatingSummary, Review, ReviewWithAuthor},
    repositories::{
        catalog as catalog_repo, engagement as engagement_repo, purchase as purchase_repo,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{ApiState, auth::CurrentUser, error::ApiError, validation::validate_payload};

pub(super) fn routes() -> Router<ApiState> {
    Router::new()
        .route("/courses/{id}/reviews", get(list_reviews).put(upsert_review))
        .route("/courses/{id}/like", post(toggle_like))
}

async fn course(state: &ApiState, course_id: Uuid) -> Result<Course, ApiError> {
    catalog_repo::find_course(&state.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

#[derive(Debug, Serialize)]
struct ReviewList {
    summary: RatingSummary,
    reviews: Vec<ReviewWithAuthor>,
}

async fn list_reviews(
    State(state): State<ApiState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ReviewList>, ApiError> {
    course(&state, course_id).await?;

    Ok(Json(ReviewList {
        summary: engagement_repo::rating_summary(&state.pool, course_id).await?,
        reviews: engagement_repo::list_reviews(&state.pool, course_id).await?,
    }))
}

#[derive(Debug, Deserialize, Validate)]
struct ReviewRequest {
    #[validate(range(min = 1, max = 5))]
    rating: i16,
    #[validate(length(max = 2000))]
    comment: Option<String>,
}

/// Only learners holding a purchase may review; resubmitting replaces.
async fn upsert_review(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    validate_payload(&request)?;
    course(&state, course_id).await?;

    if !purchase_repo::has_successful_purchase(&state.pool, learner.id, course_id).await? {
        return Err(ApiError::Forbidden("not enrolled".to_string()));
    }

    let comment = request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let review =
        engagement_repo::upsert_review(&state.pool, learner.id, course_id, request.rating, comment)
            .await?;

    Ok(Json(review))
}

#[derive(Debug, Serialize)]
struct LikeState {
    liked: bool,
    like_count: i64,
}

async fn toggle_like(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<LikeState>, ApiError> {
    course(&state, course_id).await?;

    let liked = if engagement_repo::like(&state.pool, user.id, course_id).await? {
        true
    } else {
        engagement_repo::unlike(&state.pool, user.id, course_id).await?;
        false
    };

    Ok(Json(LikeState {
        liked,
        like_count: engagement_repo::like_count(&state.pool, course_id).await?,
    }))
}
