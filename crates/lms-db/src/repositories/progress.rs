use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::LessonProgress;

/// Completed progress rows for the learner, restricted to `lesson_ids`.
pub async fn count_completed<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_ids: &[Uuid],
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*)
            FROM lesson_progress
            WHERE user_id = $1 AND lesson_id = ANY($2) AND is_completed
        "#,
    )
    .bind(user_id)
    .bind(lesson_ids)
    .fetch_one(executor)
    .await
}

/// Latest `last_accessed_at` among the learner's completed rows in `lesson_ids`.
pub async fn latest_completion_at<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_ids: &[Uuid],
) -> Result<Option<DateTime<Utc>>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT MAX(last_accessed_at)
            FROM lesson_progress
            WHERE user_id = $1 AND lesson_id = ANY($2) AND is_completed
        "#,
    )
    .bind(user_id)
    .bind(lesson_ids)
    .fetch_one(executor)
    .await
}

/// All progress rows of the learner for the given lessons.
pub async fn list_for_lessons<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_ids: &[Uuid],
) -> Result<Vec<LessonProgress>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT lesson_id, is_completed, last_accessed_at
            FROM lesson_progress
            WHERE user_id = $1 AND lesson_id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(lesson_ids)
    .fetch_all(executor)
    .await
}

pub async fn find<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
) -> Result<Option<LessonProgress>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT lesson_id, is_completed, last_accessed_at
            FROM lesson_progress
            WHERE user_id = $1 AND lesson_id = $2
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_optional(executor)
    .await
}

/// Stamp an access (playback start) without touching completion.
pub async fn record_access<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
) -> Result<LessonProgress, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO lesson_progress (user_id, lesson_id, is_completed, last_accessed_at)
            VALUES ($1, $2, FALSE, NOW())
            ON CONFLICT (user_id, lesson_id)
            DO UPDATE SET
                last_accessed_at = NOW(),
                updated_at = NOW()
            RETURNING lesson_id, is_completed, last_accessed_at
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_one(executor)
    .await
}

/// Mark or unmark a lesson as completed and stamp `last_accessed_at`.
pub async fn set_completed<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
    is_completed: bool,
) -> Result<LessonProgress, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO lesson_progress (user_id, lesson_id, is_completed, last_accessed_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, lesson_id)
            DO UPDATE SET
                is_completed = EXCLUDED.is_completed,
                last_accessed_at = NOW(),
                updated_at = NOW()
            RETURNING lesson_id, is_completed, last_accessed_at
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .bind(is_completed)
    .fetch_one(executor)
    .await
}

/// Total lessons the learner has completed across all courses.
pub async fn count_all_completed<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*) FROM lesson_progress WHERE user_id = $1 AND is_completed
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Most recent progress activity of the learner, if any.
pub async fn last_activity_at<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<DateTime<Utc>>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT last_accessed_at
            FROM lesson_progress
            WHERE user_id = $1 AND last_accessed_at IS NOT NULL
            ORDER BY last_accessed_at DESC
            LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}
