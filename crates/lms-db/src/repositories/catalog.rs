use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{ApprovalStatus, Chapter, Course, CourseSummary, Lesson, LessonContext, LessonType};

/// Published, approved courses with their engagement rollups.
pub async fn list_catalog<'e, E>(executor: E) -> Result<Vec<CourseSummary>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                c.id,
                c.title,
                c.description,
                c.price,
                c.image_url,
                c.tutor_id,
                u.name as tutor_name,
                (SELECT COUNT(*) FROM lessons l JOIN chapters ch ON ch.id = l.chapter_id WHERE ch.course_id = c.id) as lesson_count,
                (SELECT COUNT(*) FROM purchases p WHERE p.course_id = c.id AND p.status = 'SUCCESS') as student_count,
                (SELECT AVG(r.rating)::float8 FROM reviews r WHERE r.course_id = c.id) as average_rating,
                (SELECT COUNT(*) FROM reviews r WHERE r.course_id = c.id) as review_count,
                (SELECT COUNT(*) FROM course_likes cl WHERE cl.course_id = c.id) as like_count
            FROM courses c
            JOIN users u ON u.id = c.tutor_id
            WHERE c.is_published AND c.approval_status = 'APPROVED'
            ORDER BY c.created_at DESC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn find_course<'e, E>(executor: E, course_id: Uuid) -> Result<Option<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, tutor_id, title, description, price, image_url, is_published, approval_status, created_at, updated_at
            FROM courses
            WHERE id = $1
        "#,
    )
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_courses_by_tutor<'e, E>(executor: E, tutor_id: Uuid) -> Result<Vec<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, tutor_id, title, description, price, image_url, is_published, approval_status, created_at, updated_at
            FROM courses
            WHERE tutor_id = $1
            ORDER BY created_at DESC
        "#,
    )
    .bind(tutor_id)
    .fetch_all(executor)
    .await
}

pub async fn list_chapters<'e, E>(executor: E, course_id: Uuid) -> Result<Vec<Chapter>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, course_id, title, position
            FROM chapters
            WHERE course_id = $1
            ORDER BY position, created_at
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

/// Every lesson of a course, in chapter order then lesson order.
pub async fn list_lessons_for_course<'e, E>(executor: E, course_id: Uuid) -> Result<Vec<Lesson>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT l.id, l.chapter_id, l.title, l.description, l.notes, l.lesson_type, l.position, l.is_free_preview, l.created_at
            FROM lessons l
            JOIN chapters ch ON ch.id = l.chapter_id
            WHERE ch.course_id = $1
            ORDER BY ch.position, ch.created_at, l.position, l.created_at
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

/// Lesson ids of a course; the denominator for every completion figure.
pub async fn lesson_ids_for_course<'e, E>(executor: E, course_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT l.id
            FROM lessons l
            JOIN chapters ch ON ch.id = l.chapter_id
            WHERE ch.course_id = $1
            ORDER BY ch.position, l.position
        "#,
    )
    .bind(course_id)
    .fetch_all(executor)
    .await
}

pub async fn find_lesson_context<'e, E>(
    executor: E,
    lesson_id: Uuid,
) -> Result<Option<LessonContext>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                l.id as lesson_id,
                l.chapter_id,
                c.id as course_id,
                c.tutor_id,
                l.title,
                l.description,
                l.notes,
                l.lesson_type,
                l.is_free_preview,
                va.playback_id,
                l.video_upload_id
            FROM lessons l
            JOIN chapters ch ON ch.id = l.chapter_id
            JOIN courses c ON c.id = ch.course_id
            LEFT JOIN video_assets va ON va.lesson_id = l.id
            WHERE l.id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(executor)
    .await
}

pub async fn create_course<'e, E>(
    executor: E,
    tutor_id: Uuid,
    title: &str,
    description: Option<&str>,
    price: Option<i64>,
    image_url: Option<&str>,
) -> Result<Course, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO courses (tutor_id, title, description, price, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, tutor_id, title, description, price, image_url, is_published, approval_status, created_at, updated_at
        "#,
    )
    .bind(tutor_id)
    .bind(title)
    .bind(description)
    .bind(price)
    .bind(image_url)
    .fetch_one(executor)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_course<'e, E>(
    executor: E,
    course_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    price: Option<i64>,
    image_url: Option<&str>,
    is_published: Option<bool>,
) -> Result<Course, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                image_url = COALESCE($5, image_url),
                is_published = COALESCE($6, is_published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, tutor_id, title, description, price, image_url, is_published, approval_status, created_at, updated_at
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(description)
    .bind(price)
    .bind(image_url)
    .bind(is_published)
    .fetch_one(executor)
    .await
}

pub async fn set_approval<'e, E>(
    executor: E,
    course_id: Uuid,
    status: ApprovalStatus,
) -> Result<Option<Course>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE courses
            SET approval_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, tutor_id, title, description, price, image_url, is_published, approval_status, created_at, updated_at
        "#,
    )
    .bind(course_id)
    .bind(status)
    .fetch_optional(executor)
    .await
}

/// Append a chapter at the end of the course.
pub async fn create_chapter<'e, E>(executor: E, course_id: Uuid, title: &str) -> Result<Chapter, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO chapters (course_id, title, position)
            VALUES ($1, $2, (SELECT COALESCE(MAX(position) + 1, 0) FROM chapters WHERE course_id = $1))
            RETURNING id, course_id, title, position
        "#,
    )
    .bind(course_id)
    .bind(title)
    .fetch_one(executor)
    .await
}

pub async fn find_chapter<'e, E>(executor: E, chapter_id: Uuid) -> Result<Option<Chapter>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, course_id, title, position
            FROM chapters
            WHERE id = $1
        "#,
    )
    .bind(chapter_id)
    .fetch_optional(executor)
    .await
}

/// Append a lesson at the end of the chapter.
#[allow(clippy::too_many_arguments)]
pub async fn create_lesson<'e, E>(
    executor: E,
    chapter_id: Uuid,
    title: &str,
    description: Option<&str>,
    notes: Option<&str>,
    lesson_type: LessonType,
    is_free_preview: bool,
) -> Result<Lesson, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO lessons (chapter_id, title, description, notes, lesson_type, position, is_free_preview)
            VALUES ($1, $2, $3, $4, $5, (SELECT COALESCE(MAX(position) + 1, 0) FROM lessons WHERE chapter_id = $1), $6)
            RETURNING id, chapter_id, title, description, notes, lesson_type, position, is_free_preview, created_at
        "#,
    )
    .bind(chapter_id)
    .bind(title)
    .bind(description)
    .bind(notes)
    .bind(lesson_type)
    .bind(is_free_preview)
    .fetch_one(executor)
    .await
}

/// Rewrite lesson positions of a chapter to follow `ordered_ids`.
///
/// Ids that do not belong to the chapter are ignored. Returns the number of
/// lessons repositioned.
pub async fn reorder_lessons<'e, E>(
    executor: E,
    chapter_id: Uuid,
    ordered_ids: &[Uuid],
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE lessons l
            SET position = (o.ordinality - 1)::int, updated_at = NOW()
            FROM UNNEST($2::uuid[]) WITH ORDINALITY AS o(id, ordinality)
            WHERE l.id = o.id AND l.chapter_id = $1
        "#,
    )
    .bind(chapter_id)
    .bind(ordered_ids)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_lesson<'e, E>(executor: E, lesson_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM lessons WHERE id = $1
        "#,
    )
    .bind(lesson_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
