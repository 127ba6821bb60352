use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{AnswerWithAuthor, QuestionWithAuthor, RatingSummary, Review, ReviewWithAuthor};

/// One review per learner per course; a second submission replaces the first.
pub async fn upsert_review<'e, E>(
    executor: E,
    user_id: Uuid,
    course_id: Uuid,
    rating: i16,
    comment: Option<&str>,
) -> Result<Review, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO reviews (user_id, course_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, course_id)
            DO UPDATE SET
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                updated_at = NOW()
            RETURNING id, user_id, course_id, rating, comment, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(rating)
    .bind(comment)
    .fetch_one(executor)
    .await
}

pub async fn list_reviews<'e, E>(executor: E, course_id: Uuid) -> Result<Vec<ReviewWithAuthor>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                r.id,
                r.user_id,
                u.name as author_name,
                u.image_url as author_image_url,
                r.rating,
                r.comment,
                r.updated_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.course_id = $1
            ORDER BY r.updated_at DESC
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub async fn rating_summary<'e, E>(executor: E, course_id: Uuid) -> Result<RatingSummary, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT AVG(rating)::float8 as average_rating, COUNT(*) as review_count
            FROM reviews
            WHERE course_id = $1
        "#,
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}

/// Returns `true` when the like was new.
pub async fn like<'e, E>(executor: E, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO course_likes (user_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns `true` when a like was removed.
pub async fn unlike<'e, E>(executor: E, user_id: Uuid, course_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM course_likes WHERE user_id = $1 AND course_id = $2
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn like_count<'e, E>(executor: E, course_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*) FROM course_likes WHERE course_id = $1
        "#,
    )
    .bind(course_id)
    .fetch_one(executor)
    .await
}

pub async fn create_question<'e, E>(
    executor: E,
    lesson_id: Uuid,
    user_id: Uuid,
    body: &str,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO questions (lesson_id, user_id, body)
            VALUES ($1, $2, $3)
            RETURNING id
        "#,
    )
    .bind(lesson_id)
    .bind(user_id)
    .bind(body)
    .fetch_one(executor)
    .await
}

pub async fn find_question<'e, E>(executor: E, question_id: Uuid) -> Result<Option<QuestionWithAuthor>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT q.id, q.lesson_id, q.user_id, u.name as author_name, q.body, q.created_at
            FROM questions q
            JOIN users u ON u.id = q.user_id
            WHERE q.id = $1
        "#,
    )
    .bind(question_id)
    .fetch_optional(executor)
    .await
}

/// Newest questions first.
pub async fn list_questions<'e, E>(executor: E, lesson_id: Uuid) -> Result<Vec<QuestionWithAuthor>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT q.id, q.lesson_id, q.user_id, u.name as author_name, q.body, q.created_at
            FROM questions q
            JOIN users u ON u.id = q.user_id
            WHERE q.lesson_id = $1
            ORDER BY q.created_at DESC
        "#,
    )
    .bind(lesson_id)
    .fetch_all(executor)
    .await
}

pub async fn create_answer<'e, E>(
    executor: E,
    question_id: Uuid,
    user_id: Uuid,
    body: &str,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO answers (question_id, user_id, body)
            VALUES ($1, $2, $3)
            RETURNING id
        "#,
    )
    .bind(question_id)
    .bind(user_id)
    .bind(body)
    .fetch_one(executor)
    .await
}

/// Answers to every question of a lesson, oldest first.
pub async fn list_answers_for_lesson<'e, E>(
    executor: E,
    lesson_id: Uuid,
) -> Result<Vec<AnswerWithAuthor>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT a.id, a.question_id, a.user_id, u.name as author_name, a.body, a.created_at
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            JOIN users u ON u.id = a.user_id
            WHERE q.lesson_id = $1
            ORDER BY a.created_at
        "#,
    )
    .bind(lesson_id)
    .fetch_all(executor)
    .await
}
