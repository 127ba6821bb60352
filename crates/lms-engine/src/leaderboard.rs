//! Leaderboard ranking.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Points snapshot for one learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    /// Learner the row belongs to
    pub user_id: Uuid,
    /// Display name
    pub name: Option<String>,
    /// Avatar
    pub image_url: Option<String>,
    /// Lifetime points
    pub points: i64,
    /// Consecutive active days
    pub current_streak: i32,
    /// When the learner joined; the first tiebreak between equal points
    pub joined_at: DateTime<Utc>,
}

/// A ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    /// Sequential position, starting at 1
    pub rank: usize,
    /// Learner the row belongs to
    pub user_id: Uuid,
    /// Display name
    pub name: Option<String>,
    /// Avatar
    pub image_url: Option<String>,
    /// Lifetime points
    pub points: i64,
    /// Consecutive active days
    pub current_streak: i32,
}

/// Points descending, then earliest join, then id. Total order, so equal
/// inputs always rank identically.
fn by_standing(a: &ScoreCard, b: &ScoreCard) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| a.joined_at.cmp(&b.joined_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Rank score cards, keeping at most `limit` rows.
pub fn rank(mut cards: Vec<ScoreCard>, limit: usize) -> Vec<RankedEntry> {
    cards.sort_by(by_standing);
    cards
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, card)| RankedEntry {
            rank: index + 1,
            user_id: card.user_id,
            name: card.name,
            image_url: card.image_url,
            points: card.points,
            current_streak: card.current_streak,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card(points: i64, joined_day: u32, id: u128) -> ScoreCard {
        ScoreCard {
            user_id: Uuid::from_u128(id),
            name: None,
            image_url: None,
            points,
            current_streak: 0,
            joined_at: Utc.with_ymd_and_hms(2025, 1, joined_day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_rank_orders_by_points_descending() {
        let ranked = rank(vec![card(10, 1, 1), card(30, 2, 2), card(20, 3, 3)], 10);
        let points: Vec<i64> = ranked.iter().map(|r| r.points).collect();
        assert_eq!(points, vec![30, 20, 10]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_ties_break_by_join_time_then_id() {
        let ranked = rank(vec![card(10, 5, 1), card(10, 2, 9), card(10, 2, 3)], 10);
        let ids: Vec<Uuid> = ranked.iter().map(|r| r.user_id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(3), Uuid::from_u128(9), Uuid::from_u128(1)]
        );
    }

    #[test]
    fn test_ranking_is_independent_of_input_order() {
        let a = vec![card(5, 1, 1), card(5, 1, 2), card(7, 3, 3)];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(rank(a, 10), rank(b, 10));
    }

    #[test]
    fn test_limit_truncates() {
        let ranked = rank(vec![card(1, 1, 1), card(2, 1, 2), card(3, 1, 3)], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[1].points, 2);
    }
}
