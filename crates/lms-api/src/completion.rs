//! Database-backed entry point to the completion engine.
//!
//! Certificates, continue-learning, learner statistics and the progress
//! endpoints all go through [`compute_completion`], so "completed" means the
//! same thing everywhere.

use chrono::Utc;
use lms_db::repositories::{catalog as catalog_repo, progress as progress_repo};
use lms_engine::{Completion, completion::is_complete};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

/// Completion of `lesson_ids` by `learner_id`.
///
/// An empty lesson set is never complete and costs no query. The latest
/// completion timestamp is only looked up once the set is complete.
pub async fn compute_completion(
    pool: &PgPool,
    learner_id: Uuid,
    lesson_ids: &[Uuid],
) -> Result<Completion, ApiError> {
    if lesson_ids.is_empty() {
        return Ok(Completion::empty());
    }

    let total = lesson_ids.len() as i64;
    let completed = progress_repo::count_completed(pool, learner_id, lesson_ids).await?;

    if !is_complete(completed, total) {
        return Ok(Completion::in_progress(completed, total));
    }

    let latest = progress_repo::latest_completion_at(pool, learner_id, lesson_ids)
        .await?
        .unwrap_or_else(Utc::now);

    Ok(Completion::finished(total, latest))
}

/// Completion of every lesson currently in the course.
pub async fn course_completion(
    pool: &PgPool,
    learner_id: Uuid,
    course_id: Uuid,
) -> Result<Completion, ApiError> {
    let lesson_ids = catalog_repo::lesson_ids_for_course(pool, course_id).await?;
    compute_completion(pool, learner_id, &lesson_ids).await
}
