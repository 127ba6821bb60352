//! Tutor-facing rollups over purchases, progress and quiz attempts.
//!
//! All figures are recomputed from the facts handed in; nothing here keeps
//! state between calls.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{completion, quiz};

/// Width of the monthly chart window.
pub const TRAILING_MONTHS: usize = 6;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One bucket of a monthly series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    /// `YYYY-MM`
    pub month: String,
    /// Short month name for chart axes
    pub label: String,
    /// Sum for the month, zero when nothing happened
    pub value: i64,
}

/// One of the tutor's courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFact {
    /// Course the row is about
    pub course_id: Uuid,
    /// Course title
    pub title: String,
    /// Whether the course is public
    pub is_published: bool,
    /// Price in minor units, zero for free courses
    pub price: i64,
    /// Lessons across all chapters
    pub total_lessons: i64,
}

/// A successful purchase of one of the tutor's courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseFact {
    /// Course the row is about
    pub course_id: Uuid,
    /// Buying learner
    pub user_id: Uuid,
    /// Amount paid in minor units
    pub amount: i64,
    /// When the purchase was recorded
    pub purchased_at: DateTime<Utc>,
}

/// Completed lesson count for one learner in one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnerProgressFact {
    /// Course the row is about
    pub course_id: Uuid,
    /// Learner the row belongs to
    pub user_id: Uuid,
    /// Lessons of the course marked completed
    pub completed_lessons: i64,
}

/// One learner attempt at a quiz in the tutor's courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttemptFact {
    /// Quiz lesson
    pub lesson_id: Uuid,
    /// Quiz lesson title
    pub lesson_title: String,
    /// Title of the course holding the quiz
    pub course_title: String,
    /// Percentage score, 0 to 100
    pub score: i32,
}

/// Per-course line of the tutor dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoursePerformance {
    /// Course the row is about
    pub course_id: Uuid,
    /// Course title
    pub title: String,
    /// Whether the course is public
    pub is_published: bool,
    /// Price in minor units, zero for free courses
    pub price: i64,
    /// Distinct purchasing learners
    pub students: i64,
    /// Sum of purchase amounts
    pub revenue: i64,
    /// Lessons across all chapters
    pub total_lessons: i64,
    /// Average learner completion, as a percentage with one decimal
    pub completion_rate: f64,
}

/// Aggregate over every attempt at one quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizPerformance {
    /// Quiz lesson
    pub lesson_id: Uuid,
    /// Quiz lesson title
    pub lesson_title: String,
    /// Title of the course holding the quiz
    pub course_title: String,
    /// Number of recorded attempts
    pub attempts: i64,
    /// Mean score, one decimal
    pub average_score: f64,
    /// Share of attempts at or above the pass threshold, as a percentage
    pub pass_rate: f64,
}

/// Everything the tutor analytics page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TutorRollup {
    /// Sum of all purchase amounts
    pub total_revenue: i64,
    /// Distinct learners across all courses
    pub total_students: i64,
    /// Courses currently published
    pub published_courses: i64,
    /// Every course the tutor owns
    pub total_courses: i64,
    /// Mean over all quiz attempts, one decimal
    pub avg_quiz_score: f64,
    /// Zero-filled over [`TRAILING_MONTHS`]
    pub revenue_by_month: Vec<MonthlyPoint>,
    /// Zero-filled over [`TRAILING_MONTHS`]
    pub enrollments_by_month: Vec<MonthlyPoint>,
    /// One line per course
    pub per_course: Vec<CoursePerformance>,
    /// One line per quiz with attempts
    pub quiz_performance: Vec<QuizPerformance>,
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// The `months` calendar months ending with the month of `now`, oldest first.
pub fn trailing_months(now: DateTime<Utc>, months: usize) -> Vec<(i32, u32)> {
    let mut year = now.year();
    let mut month = now.month();
    let mut out = Vec::with_capacity(months);
    for _ in 0..months {
        out.push((year, month));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    out.reverse();
    out
}

/// Bucket `(instant, value)` pairs into a zero-filled monthly series.
///
/// Values outside the window are dropped; every month in the window is
/// present even when it has no activity.
pub fn monthly_series<I>(now: DateTime<Utc>, months: usize, points: I) -> Vec<MonthlyPoint>
where
    I: IntoIterator<Item = (DateTime<Utc>, i64)>,
{
    let window = trailing_months(now, months);
    let mut totals: HashMap<(i32, u32), i64> = window.iter().map(|key| (*key, 0)).collect();

    for (at, value) in points {
        if let Some(total) = totals.get_mut(&(at.year(), at.month())) {
            *total += value;
        }
    }

    window
        .into_iter()
        .map(|(year, month)| MonthlyPoint {
            month: format!("{year:04}-{month:02}"),
            label: MONTH_LABELS[(month - 1) as usize].to_string(),
            value: totals.get(&(year, month)).copied().unwrap_or(0),
        })
        .collect()
}

/// Per-lesson quiz statistics, busiest quizzes first.
pub fn quiz_performance(attempts: &[QuizAttemptFact]) -> Vec<QuizPerformance> {
    struct Acc<'a> {
        lesson_title: &'a str,
        course_title: &'a str,
        attempts: i64,
        score_sum: i64,
        passes: i64,
    }

    let mut by_lesson: BTreeMap<Uuid, Acc<'_>> = BTreeMap::new();
    for attempt in attempts {
        let acc = by_lesson.entry(attempt.lesson_id).or_insert(Acc {
            lesson_title: &attempt.lesson_title,
            course_title: &attempt.course_title,
            attempts: 0,
            score_sum: 0,
            passes: 0,
        });
        acc.attempts += 1;
        acc.score_sum += i64::from(attempt.score);
        if quiz::passed(attempt.score) {
            acc.passes += 1;
        }
    }

    let mut out: Vec<QuizPerformance> = by_lesson
        .into_iter()
        .map(|(lesson_id, acc)| QuizPerformance {
            lesson_id,
            lesson_title: acc.lesson_title.to_string(),
            course_title: acc.course_title.to_string(),
            attempts: acc.attempts,
            average_score: one_decimal(acc.score_sum as f64 / acc.attempts as f64),
            pass_rate: one_decimal(acc.passes as f64 / acc.attempts as f64 * 100.0),
        })
        .collect();

    out.sort_by(|a, b| {
        b.attempts
            .cmp(&a.attempts)
            .then_with(|| a.lesson_title.cmp(&b.lesson_title))
    });
    out
}

/// Assemble the tutor rollup.
pub fn tutor_rollup(
    now: DateTime<Utc>,
    courses: &[CourseFact],
    purchases: &[PurchaseFact],
    progress: &[LearnerProgressFact],
    attempts: &[QuizAttemptFact],
) -> TutorRollup {
    let total_revenue = purchases.iter().map(|p| p.amount).sum();
    let total_students = purchases
        .iter()
        .map(|p| p.user_id)
        .collect::<HashSet<_>>()
        .len() as i64;

    let completed: HashMap<(Uuid, Uuid), i64> = progress
        .iter()
        .map(|p| ((p.course_id, p.user_id), p.completed_lessons))
        .collect();

    let per_course = courses
        .iter()
        .map(|course| {
            let course_purchases: Vec<&PurchaseFact> = purchases
                .iter()
                .filter(|p| p.course_id == course.course_id)
                .collect();
            let learners: HashSet<Uuid> = course_purchases.iter().map(|p| p.user_id).collect();
            let per_learner: Vec<i64> = learners
                .iter()
                .map(|user_id| {
                    completed
                        .get(&(course.course_id, *user_id))
                        .copied()
                        .unwrap_or(0)
                })
                .collect();

            CoursePerformance {
                course_id: course.course_id,
                title: course.title.clone(),
                is_published: course.is_published,
                price: course.price,
                students: learners.len() as i64,
                revenue: course_purchases.iter().map(|p| p.amount).sum(),
                total_lessons: course.total_lessons,
                completion_rate: one_decimal(
                    completion::average_completion_rate(&per_learner, course.total_lessons)
                        * 100.0,
                ),
            }
        })
        .collect();

    let avg_quiz_score = if attempts.is_empty() {
        0.0
    } else {
        let sum: i64 = attempts.iter().map(|a| i64::from(a.score)).sum();
        one_decimal(sum as f64 / attempts.len() as f64)
    };

    TutorRollup {
        total_revenue,
        total_students,
        published_courses: courses.iter().filter(|c| c.is_published).count() as i64,
        total_courses: courses.len() as i64,
        avg_quiz_score,
        revenue_by_month: monthly_series(
            now,
            TRAILING_MONTHS,
            purchases.iter().map(|p| (p.purchased_at, p.amount)),
        ),
        enrollments_by_month: monthly_series(
            now,
            TRAILING_MONTHS,
            purchases.iter().map(|p| (p.purchased_at, 1)),
        ),
        per_course,
        quiz_performance: quiz_performance(attempts),
    }
}
