use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{AttemptStats, QuizAttempt, QuizQuestion};

/// Questions of a quiz lesson in authoring order.
pub async fn list_questions<'e, E>(executor: E, lesson_id: Uuid) -> Result<Vec<QuizQuestion>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, lesson_id, prompt, options, correct_option, position
            FROM quiz_questions
            WHERE lesson_id = $1
            ORDER BY position, id
        "#,
    )
    .bind(lesson_id)
    .fetch_all(executor)
    .await
}

/// Append a question at the end of the quiz.
pub async fn create_question<'e, E>(
    executor: E,
    lesson_id: Uuid,
    prompt: &str,
    options: &[String],
    correct_option: i32,
) -> Result<QuizQuestion, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO quiz_questions (lesson_id, prompt, options, correct_option, position)
            VALUES ($1, $2, $3, $4, (SELECT COALESCE(MAX(position) + 1, 0) FROM quiz_questions WHERE lesson_id = $1))
            RETURNING id, lesson_id, prompt, options, correct_option, position
        "#,
    )
    .bind(lesson_id)
    .bind(prompt)
    .bind(options)
    .bind(correct_option)
    .fetch_one(executor)
    .await
}

pub async fn insert_attempt<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
    score: i32,
    passed: bool,
) -> Result<QuizAttempt, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO quiz_attempts (user_id, lesson_id, score, passed)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, lesson_id, score, passed, completed_at
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .bind(score)
    .bind(passed)
    .fetch_one(executor)
    .await
}

pub async fn last_attempt<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
) -> Result<Option<QuizAttempt>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, lesson_id, score, passed, completed_at
            FROM quiz_attempts
            WHERE user_id = $1 AND lesson_id = $2
            ORDER BY completed_at DESC
            LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_optional(executor)
    .await
}

/// Highest scoring attempt; earliest wins a tie.
pub async fn best_attempt<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
) -> Result<Option<QuizAttempt>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, lesson_id, score, passed, completed_at
            FROM quiz_attempts
            WHERE user_id = $1 AND lesson_id = $2
            ORDER BY score DESC, completed_at
            LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_optional(executor)
    .await
}

pub async fn count_attempts<'e, E>(executor: E, user_id: Uuid, lesson_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1 AND lesson_id = $2
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_one(executor)
    .await
}

pub async fn has_passed<'e, E>(executor: E, user_id: Uuid, lesson_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(SELECT 1 FROM quiz_attempts WHERE user_id = $1 AND lesson_id = $2 AND passed)
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .fetch_one(executor)
    .await
}

/// Attempt totals across every quiz the learner has taken.
pub async fn attempt_stats<'e, E>(executor: E, user_id: Uuid) -> Result<AttemptStats, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                COUNT(*) as attempts,
                AVG(score)::float8 as average_score,
                COUNT(*) FILTER (WHERE passed) as passed
            FROM quiz_attempts
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}
