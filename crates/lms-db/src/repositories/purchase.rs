use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{EnrolledCourse, Purchase};

/// Insert a purchase unless one already exists for the same
/// `(user_id, course_id)` pair or the same `reference`.
///
/// Both uniqueness constraints are enforced by the table, so two concurrent
/// callers can never both succeed: the loser gets `None`.
pub async fn insert_if_absent<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
    amount: i64,
    reference: &str,
) -> Result<Option<Purchase>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO purchases (user_id, course_id, amount, reference)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            RETURNING id, user_id, course_id, amount, reference, status, created_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(amount)
    .bind(reference)
    .fetch_optional(executor)
    .await
}

pub async fn find_for_user_course<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<Option<Purchase>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, course_id, amount, reference, status, created_at
            FROM purchases
            WHERE user_id = $1 AND course_id = $2
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_reference<'e, E>(
    executor: E,
    reference: &str,
) -> Result<Option<Purchase>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, course_id, amount, reference, status, created_at
            FROM purchases
            WHERE reference = $1
        "#,
    )
    .bind(reference)
    .fetch_optional(executor)
    .await
}

/// Whether the learner holds a successful purchase for the course.
pub async fn has_successful_purchase<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(
                SELECT 1 FROM purchases
                WHERE user_id = $1 AND course_id = $2 AND status = 'SUCCESS'
            )
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_one(executor)
    .await
}

/// Courses the learner is enrolled in, most recently touched first.
pub async fn list_enrolled_courses<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Vec<EnrolledCourse>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                c.id as course_id,
                c.title,
                c.image_url,
                u.name as tutor_name,
                p.created_at as enrolled_at,
                (
                    SELECT MAX(lp.last_accessed_at)
                    FROM lesson_progress lp
                    JOIN lessons l ON l.id = lp.lesson_id
                    JOIN chapters ch ON ch.id = l.chapter_id
                    WHERE lp.user_id = p.user_id AND ch.course_id = c.id
                ) as last_accessed_at
            FROM purchases p
            JOIN courses c ON c.id = p.course_id
            JOIN users u ON u.id = c.tutor_id
            WHERE p.user_id = $1 AND p.status = 'SUCCESS'
            ORDER BY last_accessed_at DESC NULLS LAST, p.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

