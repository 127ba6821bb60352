use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{LearningPath, LearningPathCourse};

pub async fn create<'e, E>(
    executor: E,
    title: &str,
    description: Option<&str>,
    image_url: Option<&str>,
    created_by: Uuid,
) -> Result<LearningPath, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO learning_paths (title, description, image_url, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, image_url, created_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(image_url)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

pub async fn find<'e, E>(executor: E, path_id: Uuid) -> Result<Option<LearningPath>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, description, image_url, created_at
            FROM learning_paths
            WHERE id = $1
        "#,
    )
    .bind(path_id)
    .fetch_optional(executor)
    .await
}

pub async fn clear_courses<'e, E>(executor: E, path_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM learning_path_courses WHERE path_id = $1
        "#,
    )
    .bind(path_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Insert courses in the given order. Duplicates keep their first position.
pub async fn insert_courses<'e, E>(executor: E, path_id: Uuid, course_ids: &[Uuid]) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO learning_path_courses (path_id, course_id, position)
            SELECT $1, o.id, (o.ordinality - 1)::int
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS o(id, ordinality)
            ON CONFLICT (path_id, course_id) DO NOTHING
        "#,
    )
    .bind(path_id)
    .bind(course_ids)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list<'e, E>(executor: E) -> Result<Vec<LearningPath>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, description, image_url, created_at
            FROM learning_paths
            ORDER BY created_at DESC
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Courses of every path, ordered by path then position.
pub async fn courses_for_paths<'e, E>(executor: E) -> Result<Vec<LearningPathCourse>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT lpc.path_id, c.id as course_id, c.title, c.image_url, c.price, lpc.position
            FROM learning_path_courses lpc
            JOIN courses c ON c.id = lpc.course_id
            ORDER BY lpc.path_id, lpc.position
        "#,
    )
    .fetch_all(executor)
    .await
}
