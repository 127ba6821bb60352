//! Raw facts behind the tutor dashboard. Aggregation lives in
//! `lms_engine::rollup`; these queries only fetch.

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{CompletedLessonsRow, CoursePurchaseRow, QuizScoreRow, RecentEnrollment, TutorCourseRow};

pub async fn tutor_courses<'e, E>(executor: E, tutor_id: Uuid) -> Result<Vec<TutorCourseRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                c.id as course_id,
                c.title,
                c.is_published,
                c.price,
                (SELECT COUNT(*) FROM lessons l JOIN chapters ch ON ch.id = l.chapter_id WHERE ch.course_id = c.id) as total_lessons
            FROM courses c
            WHERE c.tutor_id = $1
            ORDER BY c.created_at
        "#,
    )
    .bind(tutor_id)
    .fetch_all(executor)
    .await
}

pub async fn tutor_purchases<'e, E>(executor: E, tutor_id: Uuid) -> Result<Vec<CoursePurchaseRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT p.course_id, p.user_id, p.amount, p.created_at
            FROM purchases p
            JOIN courses c ON c.id = p.course_id
            WHERE c.tutor_id = $1 AND p.status = 'SUCCESS'
        "#,
    )
    .bind(tutor_id)
    .fetch_all(executor)
    .await
}

/// Completed lesson counts per (course, learner) for the tutor's courses.
pub async fn completed_lessons_by_learner<'e, E>(
    executor: E,
    tutor_id: Uuid,
) -> Result<Vec<CompletedLessonsRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT ch.course_id, lp.user_id, COUNT(*) as completed_lessons
            FROM lesson_progress lp
            JOIN lessons l ON l.id = lp.lesson_id
            JOIN chapters ch ON ch.id = l.chapter_id
            JOIN courses c ON c.id = ch.course_id
            WHERE c.tutor_id = $1 AND lp.is_completed
            GROUP BY ch.course_id, lp.user_id
        "#,
    )
    .bind(tutor_id)
    .fetch_all(executor)
    .await
}

pub async fn quiz_scores<'e, E>(executor: E, tutor_id: Uuid) -> Result<Vec<QuizScoreRow>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT qa.lesson_id, l.title as lesson_title, c.title as course_title, qa.score
            FROM quiz_attempts qa
            JOIN lessons l ON l.id = qa.lesson_id
            JOIN chapters ch ON ch.id = l.chapter_id
            JOIN courses c ON c.id = ch.course_id
            WHERE c.tutor_id = $1
        "#,
    )
    .bind(tutor_id)
    .fetch_all(executor)
    .await
}

pub async fn recent_enrollments<'e, E>(
    executor: E,
    tutor_id: Uuid,
    limit: i64,
) -> Result<Vec<RecentEnrollment>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                p.id as purchase_id,
                c.id as course_id,
                c.title as course_title,
                u.name as learner_name,
                u.image_url as learner_image_url,
                p.amount,
                p.created_at
            FROM purchases p
            JOIN courses c ON c.id = p.course_id
            JOIN users u ON u.id = p.user_id
            WHERE c.tutor_id = $1 AND p.status = 'SUCCESS'
            ORDER BY p.created_at DESC
            LIMIT $2
        "#,
    )
    .bind(tutor_id)
    .bind(limit)
    .fetch_all(executor)
    .await
}
