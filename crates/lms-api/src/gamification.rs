//! Points, streaks and the public leaderboard.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use lms_db::{
    models::{AwardKind, UserPoints},
    repositories::gamification as gamification_repo,
};
use lms_engine::{
    leaderboard::{self, RankedEntry, ScoreCard},
    streak::next_streak,
};
use serde::Deserialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Awarded the first time a lesson is completed
pub const LESSON_POINTS: i64 = 10;
/// Awarded the first time a quiz is passed
pub const QUIZ_PASS_POINTS: i64 = 20;

const DEFAULT_LEADERBOARD_SIZE: usize = 20;
const MAX_LEADERBOARD_SIZE: usize = 100;

/// Add points and advance the daily streak. Run inside the caller's
/// transaction so the award commits with the event that earned it.
pub async fn award_points(
    conn: &mut PgConnection,
    user_id: Uuid,
    points: i64,
) -> Result<UserPoints, ApiError> {
    let today = Utc::now().date_naive();
    let current = gamification_repo::find_points(&mut *conn, user_id).await?;

    let (last_active, streak) = current
        .as_ref()
        .map_or((None, 0), |p| (p.last_active_date, p.current_streak));
    let streak = next_streak(last_active, streak, today);

    let updated = gamification_repo::award(&mut *conn, user_id, points, streak, today).await?;
    tracing::debug!(%user_id, points, total = updated.points, streak, "points awarded");

    Ok(updated)
}

/// Award `points` for `kind` on a lesson unless the learner already earned it.
///
/// Returns the points actually granted, `0` on a repeat.
pub async fn award_once(
    conn: &mut PgConnection,
    user_id: Uuid,
    lesson_id: Uuid,
    kind: AwardKind,
    points: i64,
) -> Result<i64, ApiError> {
    if !gamification_repo::claim_award(&mut *conn, user_id, lesson_id, kind, points).await? {
        return Ok(0);
    }
    award_points(conn, user_id, points).await?;
    Ok(points)
}

pub fn routes() -> Router<ApiState> {
    Router::new().route("/leaderboard", get(get_leaderboard))
}

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<usize>,
}

async fn get_leaderboard(
    State(state): State<ApiState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<RankedEntry>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
        .clamp(1, MAX_LEADERBOARD_SIZE);

    let rows = gamification_repo::leaderboard(&state.pool, limit as i64).await?;
    let cards = rows
        .into_iter()
        .map(|row| ScoreCard {
            user_id: row.user_id,
            name: row.name,
            image_url: row.image_url,
            points: row.points,
            current_streak: row.current_streak,
            joined_at: row.joined_at,
        })
        .collect();

    Ok(Json(leaderboard::rank(cards, limit)))
}
