use chrono::NaiveDate;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{AwardKind, LeaderboardRow, UserPoints};

pub async fn find_points<'e, E>(executor: E, user_id: Uuid) -> Result<Option<UserPoints>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT user_id, points, current_streak, longest_streak, last_active_date
            FROM user_points
            WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Record that `kind` was earned for a lesson.
///
/// Returns `false` when the award was already claimed. Concurrent claims
/// serialize on the primary key, so exactly one caller sees `true`.
pub async fn claim_award<'e, E>(
    executor: E,
    user_id: Uuid,
    lesson_id: Uuid,
    kind: AwardKind,
    points: i64,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO point_awards (user_id, lesson_id, kind, points)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, lesson_id, kind) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(lesson_id)
    .bind(kind)
    .bind(points)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Add `delta` points and store the already computed streak for `today`.
///
/// `longest_streak` only ever grows.
pub async fn award<'e, E>(
    executor: E,
    user_id: Uuid,
    delta: i64,
    current_streak: i32,
    today: NaiveDate,
) -> Result<UserPoints, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO user_points (user_id, points, current_streak, longest_streak, last_active_date)
            VALUES ($1, $2, $3, $3, $4)
            ON CONFLICT (user_id)
            DO UPDATE SET
                points = user_points.points + EXCLUDED.points,
                current_streak = EXCLUDED.current_streak,
                longest_streak = GREATEST(user_points.longest_streak, EXCLUDED.current_streak),
                last_active_date = EXCLUDED.last_active_date,
                updated_at = NOW()
            RETURNING user_id, points, current_streak, longest_streak, last_active_date
        "#,
    )
    .bind(user_id)
    .bind(delta)
    .bind(current_streak)
    .bind(today)
    .fetch_one(executor)
    .await
}

/// Candidates for the leaderboard; ranking itself happens in the engine.
pub async fn leaderboard<'e, E>(executor: E, limit: i64) -> Result<Vec<LeaderboardRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                u.id as user_id,
                u.name,
                u.image_url,
                up.points,
                up.current_streak,
                u.created_at as joined_at
            FROM user_points up
            JOIN users u ON u.id = up.user_id
            WHERE u.status NOT IN ('SUSPENDED', 'BANNED')
            ORDER BY up.points DESC, u.created_at, u.id
            LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await
}
