use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{User, UserRole, UserStatus};

const USER_COLUMNS: &str = "id, external_id, email, name, bio, expertise, interests, image_url, role, status, created_at, updated_at";

pub async fn find_by_external_id<'e, E>(
    executor: E,
    external_id: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
    ))
    .bind(external_id)
    .fetch_optional(executor)
    .await
}

/// Case-insensitive email lookup. When several accounts share an address the
/// oldest one wins.
pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) ORDER BY created_at LIMIT 1"
    ))
    .bind(email)
    .fetch_optional(executor)
    .await
}

/// Create or refresh a user from an identity provider event.
///
/// Returns the row and whether it was newly inserted.
pub async fn upsert_from_identity<'e, E>(
    executor: E,
    external_id: &str,
    email: &str,
    name: Option<&str>,
    image_url: Option<&str>,
) -> Result<(User, bool), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    #[derive(sqlx::FromRow)]
    struct Upserted {
        #[sqlx(flatten)]
        user: User,
        inserted: bool,
    }

    let row: Upserted = sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            INSERT INTO users (external_id, email, name, image_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (external_id)
            DO UPDATE SET
                email = EXCLUDED.email,
                name = COALESCE(EXCLUDED.name, users.name),
                image_url = COALESCE(EXCLUDED.image_url, users.image_url),
                updated_at = NOW()
            RETURNING {USER_COLUMNS}, (xmax = 0) AS inserted
        "#
    ))
    .bind(external_id)
    .bind(email)
    .bind(name)
    .bind(image_url)
    .fetch_one(executor)
    .await?;

    Ok((row.user, row.inserted))
}

pub async fn delete_by_external_id<'e, E>(executor: E, external_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM users WHERE external_id = $1
        "#,
    )
    .bind(external_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn update_profile<'e, E>(
    executor: E,
    user_id: Uuid,
    name: Option<&str>,
    bio: Option<&str>,
    expertise: Option<&[String]>,
    interests: Option<&[String]>,
    image_url: Option<&str>,
) -> Result<User, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                expertise = COALESCE($4, expertise),
                interests = COALESCE($5, interests),
                image_url = COALESCE($6, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(name)
    .bind(bio)
    .bind(expertise)
    .bind(interests)
    .bind(image_url)
    .fetch_one(executor)
    .await
}

/// Turn a learner into a tutor awaiting approval.
///
/// Only learners can apply; returns `None` for anyone else.
pub async fn apply_as_tutor<'e, E>(
    executor: E,
    user_id: Uuid,
    bio: &str,
    expertise: &[String],
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET role = 'TUTOR', status = 'PENDING', bio = $2, expertise = $3, updated_at = NOW()
            WHERE id = $1 AND role = 'LEARNER'
            RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(bio)
    .bind(expertise)
    .fetch_optional(executor)
    .await
}

pub async fn set_status<'e, E>(
    executor: E,
    user_id: Uuid,
    status: UserStatus,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(status)
    .fetch_optional(executor)
    .await
}

pub async fn list_by_role<'e, E>(
    executor: E,
    role: UserRole,
    status: Option<UserStatus>,
) -> Result<Vec<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        // language=PostgreSQL
        r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE role = $1 AND ($2::user_status IS NULL OR status = $2)
            ORDER BY created_at
        "#
    ))
    .bind(role)
    .bind(status)
    .fetch_all(executor)
    .await
}
