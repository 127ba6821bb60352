//! Tutor dashboard: live rollups over the tutor's own courses.

use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use lms_db::{models::RecentEnrollment, repositories::analytics as analytics_repo};
use lms_engine::rollup::{
    self, CourseFact, LearnerProgressFact, PurchaseFact, QuizAttemptFact, TutorRollup,
};
use serde::Serialize;

use crate::{ApiState, auth::CurrentUser, error::ApiError};

const RECENT_ENROLLMENTS: i64 = 10;

pub fn routes() -> Router<ApiState> {
    Router::new().route("/tutor/analytics", get(get_tutor_analytics))
}

#[derive(Debug, Serialize)]
struct TutorAnalytics {
    #[serde(flatten)]
    rollup: TutorRollup,
    recent_enrollments: Vec<RecentEnrollment>,
}

async fn get_tutor_analytics(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> Result<Json<TutorAnalytics>, ApiError> {
    user.require_author()?;
    let tutor_id = user.id();

    let courses: Vec<CourseFact> = analytics_repo::tutor_courses(&state.pool, tutor_id)
        .await?
        .into_iter()
        .map(|row| CourseFact {
            course_id: row.course_id,
            title: row.title,
            is_published: row.is_published,
            price: row.price.unwrap_or(0),
            total_lessons: row.total_lessons,
        })
        .collect();

    let purchases: Vec<PurchaseFact> = analytics_repo::tutor_purchases(&state.pool, tutor_id)
        .await?
        .into_iter()
        .map(|row| PurchaseFact {
            course_id: row.course_id,
            user_id: row.user_id,
            amount: row.amount,
            purchased_at: row.created_at,
        })
        .collect();

    let progress: Vec<LearnerProgressFact> =
        analytics_repo::completed_lessons_by_learner(&state.pool, tutor_id)
            .await?
            .into_iter()
            .map(|row| LearnerProgressFact {
                course_id: row.course_id,
                user_id: row.user_id,
                completed_lessons: row.completed_lessons,
            })
            .collect();

    let attempts: Vec<QuizAttemptFact> = analytics_repo::quiz_scores(&state.pool, tutor_id)
        .await?
        .into_iter()
        .map(|row| QuizAttemptFact {
            lesson_id: row.lesson_id,
            lesson_title: row.lesson_title,
            course_title: row.course_title,
            score: row.score,
        })
        .collect();

    let rollup = rollup::tutor_rollup(Utc::now(), &courses, &purchases, &progress, &attempts);
    let recent_enrollments =
        analytics_repo::recent_enrollments(&state.pool, tutor_id, RECENT_ENROLLMENTS).await?;

    tracing::debug!(%tutor_id, courses = courses.len(), purchases = purchases.len(), "tutor analytics computed");

    Ok(Json(TutorAnalytics {
        rollup,
        recent_enrollments,
    }))
}
