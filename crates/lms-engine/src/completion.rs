//! Course completion.
//!
//! A course is complete when every one of its lessons has a completed
//! progress row for the learner. A course with no lessons is never complete.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of evaluating one learner against one course's lesson set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Completed lessons that belong to the evaluated set
    pub completed_count: i64,
    /// Size of the evaluated lesson set
    pub total_lessons: i64,
    /// `completed_count == total_lessons` with `total_lessons > 0`
    pub is_complete: bool,
    /// Latest completion instant, only populated for complete courses
    pub latest_completion_at: Option<DateTime<Utc>>,
}

impl Completion {
    /// Result for a course that has no lessons.
    pub const fn empty() -> Self {
        Self {
            completed_count: 0,
            total_lessons: 0,
            is_complete: false,
            latest_completion_at: None,
        }
    }

    /// Result for a course the learner has not finished yet.
    pub const fn in_progress(completed_count: i64, total_lessons: i64) -> Self {
        Self {
            completed_count,
            total_lessons,
            is_complete: false,
            latest_completion_at: None,
        }
    }

    /// Result for a finished course.
    pub const fn finished(total_lessons: i64, completed_at: DateTime<Utc>) -> Self {
        Self {
            completed_count: total_lessons,
            total_lessons,
            is_complete: true,
            latest_completion_at: Some(completed_at),
        }
    }

    /// Fraction of the course completed, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        completion_fraction(self.completed_count, self.total_lessons)
    }

    /// Whole-number percentage, rounded to nearest.
    pub fn percentage(&self) -> i32 {
        (self.fraction() * 100.0).round() as i32
    }
}

/// A single lesson progress row as read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressFact {
    /// Lesson the row tracks
    pub lesson_id: Uuid,
    /// Whether the learner marked the lesson done
    pub is_completed: bool,
    /// Last time the learner opened or updated the lesson
    pub last_accessed_at: Option<DateTime<Utc>>,
}

/// The completion predicate. Every caller that reports completion goes
/// through this function.
pub const fn is_complete(completed_count: i64, total_lessons: i64) -> bool {
    total_lessons > 0 && completed_count == total_lessons
}

/// `completed / total`, clamped to `[0, 1]`; zero for empty courses.
pub fn completion_fraction(completed_count: i64, total_lessons: i64) -> f64 {
    if total_lessons <= 0 {
        return 0.0;
    }
    (completed_count as f64 / total_lessons as f64).clamp(0.0, 1.0)
}

/// Evaluate completion over in-memory progress rows.
///
/// Rows for lessons outside `lesson_ids` are ignored, as are duplicate ids
/// in `lesson_ids`. `now` stands in for the completion instant when the
/// course is complete but no completed row carries a timestamp.
pub fn evaluate(lesson_ids: &[Uuid], facts: &[ProgressFact], now: DateTime<Utc>) -> Completion {
    let lessons: HashSet<Uuid> = lesson_ids.iter().copied().collect();
    if lessons.is_empty() {
        return Completion::empty();
    }

    let completed: Vec<&ProgressFact> = facts
        .iter()
        .filter(|fact| fact.is_completed && lessons.contains(&fact.lesson_id))
        .collect();

    let completed_lessons: HashSet<Uuid> = completed.iter().map(|fact| fact.lesson_id).collect();
    let completed_count = completed_lessons.len() as i64;
    let total_lessons = lessons.len() as i64;

    if !is_complete(completed_count, total_lessons) {
        return Completion::in_progress(completed_count, total_lessons);
    }

    let latest = completed
        .iter()
        .filter_map(|fact| fact.last_accessed_at)
        .max()
        .unwrap_or(now);

    Completion::finished(total_lessons, latest)
}

/// Average of per-learner completion fractions.
///
/// `completed_per_learner` holds one entry per enrolled learner, including
/// learners with no progress at all (count 0).
pub fn average_completion_rate(completed_per_learner: &[i64], total_lessons: i64) -> f64 {
    if completed_per_learner.is_empty() || total_lessons <= 0 {
        return 0.0;
    }
    let sum: f64 = completed_per_learner
        .iter()
        .map(|completed| completion_fraction(*completed, total_lessons))
        .sum();
    sum / completed_per_learner.len() as f64
}
