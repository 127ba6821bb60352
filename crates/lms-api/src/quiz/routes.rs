use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use lms_db::{
    models::{AwardKind, LessonContext, LessonType, QuizAttempt, QuizQuestion, User},
    repositories::{catalog as catalog_repo, progress as progress_repo, quiz as quiz_repo},
};
use lms_engine::{Completion, quiz};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ApiState,
    auth::CurrentUser,
    completion::course_completion,
    entitlement::ensure_lesson_access,
    error::ApiError,
    gamification::{QUIZ_PASS_POINTS, award_once},
    middleware::rate_limit::{WRITE_BURST, WRITE_PER_SECOND, with_rate_limit},
};

pub fn routes() -> Router<ApiState> {
    let quiz_routes = Router::new()
        .route("/lessons/{id}/quiz", get(get_quiz))
        .route("/lessons/{id}/quiz/attempts", post(submit_attempt))
        .route("/lessons/{id}/quiz/attempts/summary", get(attempt_summary));

    with_rate_limit(quiz_routes, WRITE_PER_SECOND, WRITE_BURST)
}

async fn quiz_lesson(state: &ApiState, learner: &User, lesson_id: Uuid) -> Result<LessonContext, ApiError> {
    let lesson = catalog_repo::find_lesson_context(&state.pool, lesson_id)
        .await?
        .filter(|l| l.lesson_type == LessonType::Quiz)
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;
    ensure_lesson_access(&state.pool, Some(learner), &lesson).await?;
    Ok(lesson)
}

/// Count correct answers. Every question must be answered.
fn grade(questions: &[QuizQuestion], answers: &HashMap<Uuid, usize>) -> Result<usize, ApiError> {
    if questions.iter().any(|q| !answers.contains_key(&q.id)) {
        return Err(ApiError::Validation("missing answers".to_string()));
    }

    let correct = questions
        .iter()
        .filter(|q| {
            answers
                .get(&q.id)
                .is_some_and(|&choice| i32::try_from(choice).is_ok_and(|c| c == q.correct_option))
        })
        .count();
    Ok(correct)
}

#[derive(Debug, Serialize)]
struct QuizView {
    lesson_id: Uuid,
    title: String,
    pass_threshold: i32,
    questions: Vec<QuizQuestion>,
    last_attempt: Option<QuizAttempt>,
}

async fn get_quiz(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<QuizView>, ApiError> {
    let lesson = quiz_lesson(&state, &learner, lesson_id).await?;
    let questions = quiz_repo::list_questions(&state.pool, lesson_id).await?;
    let last_attempt = quiz_repo::last_attempt(&state.pool, learner.id, lesson_id).await?;

    Ok(Json(QuizView {
        lesson_id,
        title: lesson.title,
        pass_threshold: quiz::PASS_THRESHOLD,
        questions,
        last_attempt,
    }))
}

#[derive(Debug, Deserialize)]
struct AttemptRequest {
    /// Chosen option index per question id
    answers: HashMap<Uuid, usize>,
}

#[derive(Debug, Serialize)]
struct AttemptResponse {
    attempt: QuizAttempt,
    correct: usize,
    total: usize,
    points_awarded: i64,
    completion: Completion,
}

async fn submit_attempt(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(lesson_id): Path<Uuid>,
    Json(request): Json<AttemptRequest>,
) -> Result<(StatusCode, Json<AttemptResponse>), ApiError> {
    let lesson = quiz_lesson(&state, &learner, lesson_id).await?;

    let questions = quiz_repo::list_questions(&state.pool, lesson_id).await?;
    if questions.is_empty() {
        return Err(ApiError::Validation("Quiz has no questions".to_string()));
    }

    let correct = grade(&questions, &request.answers)?;
    let total = questions.len();
    let score = quiz::score(correct, total);
    let passed = quiz::passed(score);

    let mut tx = state.pool.begin().await?;
    let attempt = quiz_repo::insert_attempt(&mut *tx, learner.id, lesson_id, score, passed).await?;

    let points_awarded = if passed {
        progress_repo::set_completed(&mut *tx, learner.id, lesson_id, true).await?;
        award_once(&mut tx, learner.id, lesson_id, AwardKind::QuizPassed, QUIZ_PASS_POINTS).await?
    } else {
        0
    };
    tx.commit().await?;

    tracing::info!(learner_id = %learner.id, %lesson_id, score, passed, "quiz attempt recorded");
    let completion = course_completion(&state.pool, learner.id, lesson.course_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AttemptResponse {
            attempt,
            correct,
            total,
            points_awarded,
            completion,
        }),
    ))
}

#[derive(Debug, Serialize)]
struct AttemptSummary {
    attempts: i64,
    passed: bool,
    last_attempt: Option<QuizAttempt>,
    best_attempt: Option<QuizAttempt>,
}

async fn attempt_summary(
    State(state): State<ApiState>,
    CurrentUser(learner): CurrentUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<AttemptSummary>, ApiError> {
    quiz_lesson(&state, &learner, lesson_id).await?;

    Ok(Json(AttemptSummary {
        attempts: quiz_repo::count_attempts(&state.pool, learner.id, lesson_id).await?,
        passed: quiz_repo::has_passed(&state.pool, learner.id, lesson_id).await?,
        last_attempt: quiz_repo::last_attempt(&state.pool, learner.id, lesson_id).await?,
        best_attempt: quiz_repo::best_attempt(&state.pool, learner.id, lesson_id).await?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct_option: i32) -> QuizQuestion {
        QuizQuestion {
            id: Uuid::new_v4(),
            lesson_id: Uuid::nil(),
            prompt: "?".to_string(),
            options: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            correct_option,
            position: 0,
        }
    }

    #[test]
    fn test_grade_counts_correct_answers() {
        let questions = vec![question(0), question(1), question(2)];
        let answers = HashMap::from([
            (questions[0].id, 0),
            (questions[1].id, 1),
            (questions[2].id, 0),
        ]);

        let correct = grade(&questions, &answers).unwrap();
        assert_eq!(correct, 2);
        assert_eq!(quiz::score(correct, questions.len()), 67);
    }

    #[test]
    fn test_grade_rejects_missing_answers() {
        let questions = vec![question(0), question(1)];
        let answers = HashMap::from([(questions[0].id, 0)]);

        match grade(&questions, &answers) {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "missing answers"),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_grade_ignores_unknown_questions() {
        let questions = vec![question(1)];
        let answers = HashMap::from([(questions[0].id, 1), (Uuid::new_v4(), 0)]);
        assert_eq!(grade(&questions, &answers).unwrap(), 1);
    }
}
