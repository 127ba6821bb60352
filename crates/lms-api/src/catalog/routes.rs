use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use lms_db::{
    models::{Chapter, Course, CourseSummary, Lesson, LessonType, RatingSummary},
    repositories::{catalog as catalog_repo, engagement as engagement_repo},
};
use lms_engine::entitlement::AccessDecision;
use serde::Serialize;
use uuid::Uuid;

use super::can_view;
use crate::{
    ApiState,
    auth::MaybeUser,
    entitlement::{can_access_lesson, is_entitled},
    error::ApiError,
};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/{id}", get(get_course))
        .route("/lessons/{id}", get(get_lesson))
}

async fn list_courses(State(state): State<ApiState>) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    Ok(Json(catalog_repo::list_catalog(&state.pool).await?))
}

#[derive(Debug, Serialize)]
struct LessonOutline {
    id: Uuid,
    title: String,
    lesson_type: LessonType,
    position: i32,
    is_free_preview: bool,
}

#[derive(Debug, Serialize)]
struct ChapterOutline {
    id: Uuid,
    title: String,
    position: i32,
    lessons: Vec<LessonOutline>,
}

#[derive(Debug, Serialize)]
struct CourseDetail {
    #[serde(flatten)]
    course: Course,
    chapters: Vec<ChapterOutline>,
    total_lessons: usize,
    rating: RatingSummary,
    like_count: i64,
    /// Whether the caller may open every lesson of the course
    has_access: bool,
}

/// Group lessons (already in course order) under their chapters.
fn outline(chapters: Vec<Chapter>, lessons: Vec<Lesson>) -> Vec<ChapterOutline> {
    let mut outline: Vec<ChapterOutline> = chapters
        .into_iter()
        .map(|ch| ChapterOutline {
            id: ch.id,
            title: ch.title,
            position: ch.position,
            lessons: Vec::new(),
        })
        .collect();

    for lesson in lessons {
        if let Some(chapter) = outline.iter_mut().find(|ch| ch.id == lesson.chapter_id) {
            chapter.lessons.push(LessonOutline {
                id: lesson.id,
                title: lesson.title,
                lesson_type: lesson.lesson_type,
                position: lesson.position,
                is_free_preview: lesson.is_free_preview,
            });
        }
    }
    outline
}

async fn get_course(
    State(state): State<ApiState>,
    MaybeUser(viewer): MaybeUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = catalog_repo::find_course(&state.pool, course_id)
        .await?
        .filter(|c| can_view(c, viewer.as_ref()))
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let chapters = catalog_repo::list_chapters(&state.pool, course_id).await?;
    let lessons = catalog_repo::list_lessons_for_course(&state.pool, course_id).await?;
    let total_lessons = lessons.len();
    let rating = engagement_repo::rating_summary(&state.pool, course_id).await?;
    let like_count = engagement_repo::like_count(&state.pool, course_id).await?;

    let has_access = match viewer.as_ref() {
        Some(user) => is_entitled(&state.pool, user, course.id, course.tutor_id).await?,
        None => false,
    };

    Ok(Json(CourseDetail {
        course,
        chapters: outline(chapters, lessons),
        total_lessons,
        rating,
        like_count,
        has_access,
    }))
}

#[derive(Debug, Serialize)]
struct LessonDetail {
    id: Uuid,
    course_id: Uuid,
    chapter_id: Uuid,
    title: String,
    description: Option<String>,
    lesson_type: LessonType,
    is_free_preview: bool,
    has_access: bool,
    /// Only present when the caller may watch the lesson
    playback_id: Option<String>,
    notes: Option<String>,
}

/// Lesson metadata is public wherever its course is; playback and notes
/// follow the access decision.
async fn get_lesson(
    State(state): State<ApiState>,
    MaybeUser(viewer): MaybeUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<LessonDetail>, ApiError> {
    let not_found = || ApiError::NotFound("Lesson not found".to_string());
    let lesson = catalog_repo::find_lesson_context(&state.pool, lesson_id)
        .await?
        .ok_or_else(not_found)?;
    catalog_repo::find_course(&state.pool, lesson.course_id)
        .await?
        .filter(|c| can_view(c, viewer.as_ref()))
        .ok_or_else(not_found)?;

    let decision = can_access_lesson(&state.pool, viewer.as_ref(), &lesson).await?;
    let has_access = decision == AccessDecision::Allowed;

    Ok(Json(LessonDetail {
        id: lesson.lesson_id,
        course_id: lesson.course_id,
        chapter_id: lesson.chapter_id,
        title: lesson.title,
        description: lesson.description,
        lesson_type: lesson.lesson_type,
        is_free_preview: lesson.is_free_preview,
        has_access,
        playback_id: lesson.playback_id.filter(|_| has_access),
        notes: lesson.notes.filter(|_| has_access),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chapter(position: i32) -> Chapter {
        Chapter {
            id: Uuid::new_v4(),
            course_id: Uuid::nil(),
            title: format!("Chapter {position}"),
            position,
        }
    }

    fn lesson(chapter_id: Uuid, title: &str, position: i32) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            chapter_id,
            title: title.to_string(),
            description: None,
            notes: None,
            lesson_type: LessonType::Video,
            position,
            is_free_preview: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_outline_groups_lessons_in_order() {
        let first = chapter(0);
        let second = chapter(1);
        let lessons = vec![
            lesson(first.id, "intro", 0),
            lesson(first.id, "setup", 1),
            lesson(second.id, "deep dive", 0),
        ];

        let outline = outline(vec![first, second], lessons);

        assert_eq!(outline.len(), 2);
        let titles: Vec<&str> = outline[0].lessons.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["intro", "setup"]);
        assert_eq!(outline[1].lessons.len(), 1);
    }

    #[test]
    fn test_empty_chapter_kept() {
        let outline = outline(vec![chapter(0)], Vec::new());
        assert_eq!(outline.len(), 1);
        assert!(outline[0].lessons.is_empty());
    }
}
