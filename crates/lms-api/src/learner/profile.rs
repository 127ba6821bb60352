use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use lms_db::{
    models::{User, UserPoints},
    repositories::{
        catalog as catalog_repo, gamification as gamification_repo, progress as progress_repo,
        purchase as purchase_repo, quiz as quiz_repo, user as user_repo,
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    ApiState,
    auth::CurrentUser,
    completion::compute_completion,
    email::{Notification, notify},
    error::ApiError,
    validation::{normalize_tags, validate_payload, validate_tags},
};

#[derive(Debug, Serialize)]
pub(super) struct MeResponse {
    #[serde(flatten)]
    user: User,
    points: Option<UserPoints>,
}

pub(super) async fn get_me(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
    let points = gamification_repo::find_points(&state.pool, user.id).await?;
    Ok(Json(MeResponse { user, points }))
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct ProfileUpdate {
    #[validate(length(min = 1, max = 255))]
    name: Option<String>,
    #[validate(length(max = 2000))]
    bio: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    expertise: Option<Vec<String>>,
    #[validate(custom(function = "validate_tags"))]
    interests: Option<Vec<String>>,
    #[validate(url)]
    image_url: Option<String>,
}

pub(super) async fn update_me(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    validate_payload(&update)?;

    let expertise = update.expertise.as_deref().map(normalize_tags);
    let interests = update.interests.as_deref().map(normalize_tags);

    let updated = user_repo::update_profile(
        &state.pool,
        user.id,
        update.name.as_deref().map(str::trim),
        update.bio.as_deref(),
        expertise.as_deref(),
        interests.as_deref(),
        update.image_url.as_deref(),
    )
    .await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct TutorApplication {
    #[validate(length(min = 20, max = 2000))]
    bio: String,
    #[validate(length(min = 1), custom(function = "validate_tags"))]
    expertise: Vec<String>,
}

/// A learner applies to teach; an admin approves or rejects later.
pub(super) async fn apply_as_tutor(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Json(application): Json<TutorApplication>,
) -> Result<Json<User>, ApiError> {
    validate_payload(&application)?;

    let expertise = normalize_tags(&application.expertise);
    let applied = user_repo::apply_as_tutor(&state.pool, user.id, application.bio.trim(), &expertise)
        .await?
        .ok_or_else(|| ApiError::Validation("Only learners can apply to teach".to_string()))?;

    tracing::info!(user_id = %applied.id, "tutor application submitted");
    notify(
        state.email_service.as_ref(),
        &applied.email,
        Notification::TutorApplicationReceived {
            name: applied.name.clone(),
        },
    );

    Ok(Json(applied))
}

#[derive(Debug, Serialize)]
pub(super) struct LearnerStats {
    enrolled_courses: usize,
    completed_courses: usize,
    lessons_completed: i64,
    quiz_attempts: i64,
    quizzes_passed: i64,
    average_quiz_score: Option<f64>,
    points: i64,
    current_streak: i32,
    longest_streak: i32,
    last_activity_at: Option<DateTime<Utc>>,
}

pub(super) async fn get_stats(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
) -> Result<Json<LearnerStats>, ApiError> {
    let enrolled = purchase_repo::list_enrolled_courses(&state.pool, learner.id).await?;

    let mut completed_courses = 0;
    for course in &enrolled {
        let lesson_ids = catalog_repo::lesson_ids_for_course(&state.pool, course.course_id).await?;
        if compute_completion(&state.pool, learner.id, &lesson_ids)
            .await?
            .is_complete
        {
            completed_courses += 1;
        }
    }

    let quiz = quiz_repo::attempt_stats(&state.pool, learner.id).await?;
    let points = gamification_repo::find_points(&state.pool, learner.id).await?;

    Ok(Json(LearnerStats {
        enrolled_courses: enrolled.len(),
        completed_courses,
        lessons_completed: progress_repo::count_all_completed(&state.pool, learner.id).await?,
        quiz_attempts: quiz.attempts,
        quizzes_passed: quiz.passed,
        average_quiz_score: quiz.average_score.map(|s| (s * 10.0).round() / 10.0),
        points: points.as_ref().map_or(0, |p| p.points),
        current_streak: points.as_ref().map_or(0, |p| p.current_streak),
        longest_streak: points.as_ref().map_or(0, |p| p.longest_streak),
        last_activity_at: progress_repo::last_activity_at(&state.pool, learner.id).await?,
    }))
}
