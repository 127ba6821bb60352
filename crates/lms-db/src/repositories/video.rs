use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::VideoAsset;

/// Remember the direct-upload id issued for a lesson.
pub async fn set_upload_id<'e, E>(executor: E, lesson_id: Uuid, upload_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE lessons SET video_upload_id = $2, updated_at = NOW() WHERE id = $1
        "#,
    )
    .bind(lesson_id)
    .bind(upload_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// One asset per lesson; a later asset replaces the earlier one.
pub async fn upsert_asset<'e, E>(
    executor: E,
    lesson_id: Uuid,
    asset_id: &str,
    playback_id: Option<&str>,
) -> Result<VideoAsset, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO video_assets (lesson_id, asset_id, playback_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (lesson_id)
            DO UPDATE SET
                asset_id = EXCLUDED.asset_id,
                playback_id = EXCLUDED.playback_id,
                updated_at = NOW()
            RETURNING lesson_id, asset_id, playback_id, updated_at
        "#,
    )
    .bind(lesson_id)
    .bind(asset_id)
    .bind(playback_id)
    .fetch_one(executor)
    .await
}

pub async fn find_asset<'e, E>(executor: E, lesson_id: Uuid) -> Result<Option<VideoAsset>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT lesson_id, asset_id, playback_id, updated_at
            FROM video_assets
            WHERE lesson_id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(executor)
    .await
}
