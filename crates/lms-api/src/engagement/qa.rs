use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use lms_db::{
    models::{AnswerWithAuthor, LessonContext, QuestionWithAuthor},
    repositories::{catalog as catalog_repo, engagement as engagement_repo},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    ApiState,
    auth::CurrentUser,
    entitlement::ensure_lesson_access,
    error::ApiError,
    validation::validate_payload,
};

pub(super) fn routes() -> Router<ApiState> {
    Router::new()
        .route("/lessons/{id}/questions", get(list_questions).post(ask_question))
        .route("/questions/{id}/answers", post(answer_question))
}

async fn lesson(state: &ApiState, lesson_id: Uuid) -> Result<LessonContext, ApiError> {
    catalog_repo::find_lesson_context(&state.pool, lesson_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))
}

#[derive(Debug, Serialize)]
struct Thread {
    #[serde(flatten)]
    question: QuestionWithAuthor,
    answers: Vec<AnswerWithAuthor>,
}

fn threads(questions: Vec<QuestionWithAuthor>, mut answers: Vec<AnswerWithAuthor>) -> Vec<Thread> {
    questions
        .into_iter()
        .map(|question| {
            let (mine, rest): (Vec<_>, Vec<_>) =
                answers.drain(..).partition(|a| a.question_id == question.id);
            answers = rest;
            Thread {
                question,
                answers: mine,
            }
        })
        .collect()
}

async fn list_questions(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<Vec<Thread>>, ApiError> {
    let lesson = lesson(&state, lesson_id).await?;
    ensure_lesson_access(&state.pool, Some(&user), &lesson).await?;

    let questions = engagement_repo::list_questions(&state.pool, lesson_id).await?;
    let answers = engagement_repo::list_answers_for_lesson(&state.pool, lesson_id).await?;

    Ok(Json(threads(questions, answers)))
}

#[derive(Debug, Deserialize, Validate)]
struct PostBody {
    #[validate(length(min = 1, max = 5000))]
    body: String,
}

#[derive(Debug, Serialize)]
struct Created {
    id: Uuid,
}

async fn ask_question(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(lesson_id): Path<Uuid>,
    Json(post): Json<PostBody>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    validate_payload(&post)?;
    let lesson = lesson(&state, lesson_id).await?;
    ensure_lesson_access(&state.pool, Some(&user), &lesson).await?;

    let id = engagement_repo::create_question(&state.pool, lesson_id, user.id, post.body.trim()).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// The course's tutor may always answer; anyone else needs lesson access.
async fn answer_question(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(question_id): Path<Uuid>,
    Json(post): Json<PostBody>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    validate_payload(&post)?;
    let question = engagement_repo::find_question(&state.pool, question_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    let lesson = lesson(&state, question.lesson_id).await?;

    if user.id != lesson.tutor_id {
        ensure_lesson_access(&state.pool, Some(&user), &lesson).await?;
    }

    let id = engagement_repo::create_answer(&state.pool, question_id, user.id, post.body.trim()).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}
