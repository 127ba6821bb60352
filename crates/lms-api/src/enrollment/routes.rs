use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use lms_db::{
    models::{Course, User},
    repositories::catalog as catalog_repo,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    paystack::validate_reference,
    service::{EnrollmentOutcome, Evidence, enroll},
};
use crate::{
    ApiState,
    auth::CurrentUser,
    catalog::can_view,
    error::ApiError,
    middleware::rate_limit::{ENROLLMENT_BURST, ENROLLMENT_PER_SECOND, with_rate_limit},
};

pub fn routes() -> Router<ApiState> {
    let enrollment_routes = Router::new()
        .route("/courses/{id}/enroll/free", post(enroll_free))
        .route("/courses/{id}/enroll/verify", post(enroll_verified));

    with_rate_limit(enrollment_routes, ENROLLMENT_PER_SECOND, ENROLLMENT_BURST)
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    reference: String,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub status: &'static str,
    pub already_enrolled: bool,
    pub purchase_id: Option<Uuid>,
}

impl From<EnrollmentOutcome> for EnrollmentResponse {
    fn from(outcome: EnrollmentOutcome) -> Self {
        Self {
            status: "success",
            already_enrolled: outcome.already_enrolled(),
            purchase_id: outcome.purchase().map(|p| p.id),
        }
    }
}

/// Drafts and courses awaiting review cannot be enrolled in, except by
/// those who can already see them.
async fn enrollable_course(
    state: &ApiState,
    learner: &User,
    course_id: Uuid,
) -> Result<Course, ApiError> {
    catalog_repo::find_course(&state.pool, course_id)
        .await?
        .filter(|c| can_view(c, Some(learner)))
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

async fn enroll_free(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let course = enrollable_course(&state, &learner, course_id).await?;
    let outcome = enroll(&state, &learner, &course, Evidence::Free).await?;
    Ok(Json(outcome.into()))
}

/// Confirm a checkout the client completed. Only the gateway's own view of
/// the transaction is trusted.
async fn enroll_verified(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let reference = payload.reference.trim();
    validate_reference(reference)?;

    let course = enrollable_course(&state, &learner, course_id).await?;
    let payment = state.payments.verify_transaction(reference).await?;

    let outcome = enroll(&state, &learner, &course, Evidence::Verified(payment)).await?;
    Ok(Json(outcome.into()))
}
