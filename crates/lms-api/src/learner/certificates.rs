use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use lms_db::{
    models::{EnrolledCourse, Lesson},
    repositories::{
        catalog as catalog_repo, progress as progress_repo, purchase as purchase_repo,
    },
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiState, auth::CurrentUser, completion::compute_completion, error::ApiError};

/// Most courses returned by continue-learning
const CONTINUE_LEARNING_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub(super) struct Certificate {
    course_id: Uuid,
    course_title: String,
    course_image_url: Option<String>,
    tutor_name: Option<String>,
    learner_name: Option<String>,
    total_lessons: i64,
    completed_at: DateTime<Utc>,
}

/// Certificates for every enrolled course the learner has finished.
pub(super) async fn list_certificates(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    let enrolled = purchase_repo::list_enrolled_courses(&state.pool, learner.id).await?;

    let mut certificates = Vec::new();
    for course in enrolled {
        let lesson_ids = catalog_repo::lesson_ids_for_course(&state.pool, course.course_id).await?;
        let completion = compute_completion(&state.pool, learner.id, &lesson_ids).await?;

        if let Some(completed_at) = completion.latest_completion_at.filter(|_| completion.is_complete) {
            certificates.push(Certificate {
                course_id: course.course_id,
                course_title: course.title,
                course_image_url: course.image_url,
                tutor_name: course.tutor_name,
                learner_name: learner.name.clone(),
                total_lessons: completion.total_lessons,
                completed_at,
            });
        }
    }

    certificates.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(Json(certificates))
}

pub(super) async fn get_certificate(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Certificate>, ApiError> {
    let course = catalog_repo::find_course(&state.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let enrolled = purchase_repo::list_enrolled_courses(&state.pool, learner.id)
        .await?
        .into_iter()
        .find(|c| c.course_id == course_id)
        .ok_or_else(|| ApiError::Forbidden("not enrolled".to_string()))?;

    let lesson_ids = catalog_repo::lesson_ids_for_course(&state.pool, course_id).await?;
    let completion = compute_completion(&state.pool, learner.id, &lesson_ids).await?;

    let completed_at = completion
        .latest_completion_at
        .filter(|_| completion.is_complete)
        .ok_or_else(|| ApiError::Forbidden("course not yet completed".to_string()))?;

    Ok(Json(Certificate {
        course_id,
        course_title: course.title,
        course_image_url: course.image_url,
        tutor_name: enrolled.tutor_name,
        learner_name: learner.name,
        total_lessons: completion.total_lessons,
        completed_at,
    }))
}

#[derive(Debug, Serialize)]
struct NextLesson {
    id: Uuid,
    title: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ContinueLearning {
    course_id: Uuid,
    title: String,
    image_url: Option<String>,
    tutor_name: Option<String>,
    last_accessed_at: Option<DateTime<Utc>>,
    completed_lessons: i64,
    total_lessons: i64,
    percentage: i32,
    next_lesson: Option<NextLesson>,
}

/// First lesson in course order the learner has not completed.
fn next_lesson(lessons: Vec<Lesson>, completed: &[Uuid]) -> Option<NextLesson> {
    lessons
        .into_iter()
        .find(|l| !completed.contains(&l.id))
        .map(|l| NextLesson { id: l.id, title: l.title })
}

/// Started but unfinished courses, most recently touched first.
pub(super) async fn continue_learning(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
) -> Result<Json<Vec<ContinueLearning>>, ApiError> {
    let touched: Vec<EnrolledCourse> = purchase_repo::list_enrolled_courses(&state.pool, learner.id)
        .await?
        .into_iter()
        .filter(|c| c.last_accessed_at.is_some())
        .collect();

    let mut items = Vec::new();
    for course in touched {
        if items.len() == CONTINUE_LEARNING_LIMIT {
            break;
        }

        let lessons = catalog_repo::list_lessons_for_course(&state.pool, course.course_id).await?;
        let lesson_ids: Vec<Uuid> = lessons.iter().map(|l| l.id).collect();
        let completion = compute_completion(&state.pool, learner.id, &lesson_ids).await?;
        if completion.is_complete || completion.total_lessons == 0 {
            continue;
        }

        let completed: Vec<Uuid> = progress_repo::list_for_lessons(&state.pool, learner.id, &lesson_ids)
            .await?
            .into_iter()
            .filter(|p| p.is_completed)
            .map(|p| p.lesson_id)
            .collect();

        items.push(ContinueLearning {
            course_id: course.course_id,
            title: course.title,
            image_url: course.image_url,
            tutor_name: course.tutor_name,
            last_accessed_at: course.last_accessed_at,
            completed_lessons: completion.completed_count,
            total_lessons: completion.total_lessons,
            percentage: completion.percentage(),
            next_lesson: next_lesson(lessons, &completed),
        });
    }

    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_db::models::LessonType;

    fn lesson(title: &str) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            chapter_id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            notes: None,
            lesson_type: LessonType::Video,
            position: 0,
            is_free_preview: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_next_lesson_skips_completed() {
        let lessons = vec![lesson("one"), lesson("two"), lesson("three")];
        let completed = vec![lessons[0].id, lessons[2].id];

        let next = next_lesson(lessons, &completed).unwrap();
        assert_eq!(next.title, "two");
    }

    #[test]
    fn test_next_lesson_none_when_all_done() {
        let lessons = vec![lesson("one")];
        let completed = vec![lessons[0].id];
        assert!(next_lesson(lessons, &completed).is_none());
    }
}
