//! Course authoring for active tutors. Every write checks ownership of the
//! course it touches; org admins pass every ownership check.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};
use lms_db::{
    models::{Chapter, Course, Lesson, LessonType, QuizQuestion},
    repositories::{catalog as catalog_repo, quiz as quiz_repo},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    ApiState,
    auth::CurrentUser,
    error::ApiError,
    middleware::rate_limit::{WRITE_BURST, WRITE_PER_SECOND, with_rate_limit},
    validation::{validate_options, validate_payload},
};

pub(super) fn routes() -> Router<ApiState> {
    let authoring_routes = Router::new()
        .route("/tutor/courses", get(list_own_courses).post(create_course))
        .route("/tutor/courses/{id}", patch(update_course))
        .route("/tutor/courses/{id}/chapters", post(create_chapter))
        .route("/tutor/chapters/{id}/lessons", post(create_lesson))
        .route("/tutor/chapters/{id}/lesson-order", put(reorder_lessons))
        .route("/tutor/lessons/{id}", delete(delete_lesson))
        .route("/tutor/lessons/{id}/questions", post(create_quiz_question));

    with_rate_limit(authoring_routes, WRITE_PER_SECOND, WRITE_BURST)
}

async fn owned_course(state: &ApiState, user: &CurrentUser, course_id: Uuid) -> Result<Course, ApiError> {
    user.require_author()?;
    let course = catalog_repo::find_course(&state.pool, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
    user.require_owner(course.tutor_id)?;
    Ok(course)
}

async fn owned_chapter(state: &ApiState, user: &CurrentUser, chapter_id: Uuid) -> Result<Chapter, ApiError> {
    user.require_author()?;
    let chapter = catalog_repo::find_chapter(&state.pool, chapter_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chapter not found".to_string()))?;
    owned_course(state, user, chapter.course_id).await?;
    Ok(chapter)
}

async fn list_own_courses(
    State(state): State<ApiState>,
    user: CurrentUser,
) -> Result<Json<Vec<Course>>, ApiError> {
    user.require_author()?;
    Ok(Json(catalog_repo::list_courses_by_tutor(&state.pool, user.id()).await?))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    title: String,
    #[validate(length(max = 10000))]
    description: Option<String>,
    #[validate(range(min = 0))]
    price: Option<i64>,
    #[validate(url)]
    image_url: Option<String>,
}

async fn create_course(
    State(state): State<ApiState>,
    user: CurrentUser,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    user.require_author()?;
    validate_payload(&payload)?;

    let course = catalog_repo::create_course(
        &state.pool,
        user.id(),
        payload.title.trim(),
        payload.description.as_deref(),
        payload.price,
        payload.image_url.as_deref(),
    )
    .await?;
    tracing::info!(course_id = %course.id, tutor_id = %user.id(), "course created");

    Ok((StatusCode::CREATED, Json(course)))
}

#[derive(Debug, Deserialize, Validate)]
struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    title: Option<String>,
    #[validate(length(max = 10000))]
    description: Option<String>,
    #[validate(range(min = 0))]
    price: Option<i64>,
    #[validate(url)]
    image_url: Option<String>,
    is_published: Option<bool>,
}

async fn update_course(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, ApiError> {
    validate_payload(&payload)?;
    owned_course(&state, &user, course_id).await?;

    let course = catalog_repo::update_course(
        &state.pool,
        course_id,
        payload.title.as_deref().map(str::trim),
        payload.description.as_deref(),
        payload.price,
        payload.image_url.as_deref(),
        payload.is_published,
    )
    .await?;

    Ok(Json(course))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateChapterRequest {
    #[validate(length(min = 1, max = 255))]
    title: String,
}

async fn create_chapter(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<CreateChapterRequest>,
) -> Result<(StatusCode, Json<Chapter>), ApiError> {
    validate_payload(&payload)?;
    owned_course(&state, &user, course_id).await?;

    let chapter = catalog_repo::create_chapter(&state.pool, course_id, payload.title.trim()).await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

#[derive(Debug, Deserialize, Validate)]
struct CreateLessonRequest {
    #[validate(length(min = 1, max = 255))]
    title: String,
    description: Option<String>,
    notes: Option<String>,
    lesson_type: LessonType,
    #[serde(default)]
    is_free_preview: bool,
}

async fn create_lesson(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(chapter_id): Path<Uuid>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<(StatusCode, Json<Lesson>), ApiError> {
    validate_payload(&payload)?;
    owned_chapter(&state, &user, chapter_id).await?;

    let lesson = catalog_repo::create_lesson(
        &state.pool,
        chapter_id,
        payload.title.trim(),
        payload.description.as_deref(),
        payload.notes.as_deref(),
        payload.lesson_type,
        payload.is_free_preview,
    )
    .await?;
    tracing::info!(lesson_id = %lesson.id, %chapter_id, "lesson created");

    Ok((StatusCode::CREATED, Json(lesson)))
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    lesson_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
struct ReorderResponse {
    reordered: u64,
}

async fn reorder_lessons(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(chapter_id): Path<Uuid>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<ReorderResponse>, ApiError> {
    owned_chapter(&state, &user, chapter_id).await?;

    let mut seen = std::collections::HashSet::new();
    if !payload.lesson_ids.iter().all(|id| seen.insert(*id)) {
        return Err(ApiError::Validation("Duplicate lesson id in ordering".to_string()));
    }

    let reordered = catalog_repo::reorder_lessons(&state.pool, chapter_id, &payload.lesson_ids).await?;
    Ok(Json(ReorderResponse { reordered }))
}

async fn delete_lesson(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require_author()?;
    let lesson = catalog_repo::find_lesson_context(&state.pool, lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;
    user.require_owner(lesson.tutor_id)?;

    catalog_repo::delete_lesson(&state.pool, lesson_id).await?;
    tracing::info!(%lesson_id, "lesson deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "correct_option_in_range"))]
struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    prompt: String,
    #[validate(custom(function = "validate_options"))]
    options: Vec<String>,
    correct_option: usize,
}

fn correct_option_in_range(request: &CreateQuestionRequest) -> Result<(), validator::ValidationError> {
    if request.correct_option < request.options.len() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("correct_option_out_of_range"))
    }
}

/// The author's view of a question, including the answer key.
#[derive(Debug, Serialize)]
struct AuthoredQuestion {
    #[serde(flatten)]
    question: QuizQuestion,
    correct_option: i32,
}

async fn create_quiz_question(
    State(state): State<ApiState>,
    user: CurrentUser,
    Path(lesson_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<AuthoredQuestion>), ApiError> {
    validate_payload(&payload)?;
    user.require_author()?;
    let lesson = catalog_repo::find_lesson_context(&state.pool, lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;
    user.require_owner(lesson.tutor_id)?;

    if lesson.lesson_type != LessonType::Quiz {
        return Err(ApiError::Validation("Lesson is not a quiz".to_string()));
    }

    let options: Vec<String> = payload.options.iter().map(|o| o.trim().to_string()).collect();
    let correct_option = i32::try_from(payload.correct_option)
        .map_err(|_| ApiError::Validation("correct_option out of range".to_string()))?;

    let question =
        quiz_repo::create_question(&state.pool, lesson_id, payload.prompt.trim(), &options, correct_option)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthoredQuestion {
            correct_option: question.correct_option,
            question,
        }),
    ))
}
