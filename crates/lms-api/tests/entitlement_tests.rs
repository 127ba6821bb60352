use axum::http::StatusCode;
use serde_json::Value;
use uuid::Uuid;

use crate::common::{TestClient, TestStateBuilder, db};

struct PaidCourse {
    course_id: Uuid,
    preview_lesson: Uuid,
    paid_lesson: Uuid,
}

async fn paid_course(pool: &sqlx::PgPool, tutor_id: Uuid) -> PaidCourse {
    let course_id = db::create_course(pool, tutor_id, Some(10_000))
        .await
        .expect("course");
    let chapter = db::create_chapter(pool, course_id, 0).await.expect("chapter");
    let preview_lesson = db::create_lesson(pool, chapter, 0, "VIDEO", true)
        .await
        .expect("preview lesson");
    let paid_lesson = db::create_lesson(pool, chapter, 1, "VIDEO", false)
        .await
        .expect("paid lesson");

    PaidCourse {
        course_id,
        preview_lesson,
        paid_lesson,
    }
}

#[tokio::test]
async fn test_anonymous_preview_and_paid_lessons() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    let course = paid_course(&state.pool, tutor.id).await;
    let client = TestClient::for_state(&state);

    let preview = client.get(&format!("/lessons/{}", course.preview_lesson)).await;
    preview.assert_status(StatusCode::OK);
    let preview: Value = preview.json();
    assert_eq!(preview["has_access"], true);
    assert_eq!(preview["notes"], "Lesson notes");

    let paid = client.get(&format!("/lessons/{}", course.paid_lesson)).await;
    paid.assert_status(StatusCode::OK);
    let paid: Value = paid.json();
    assert_eq!(paid["has_access"], false);
    assert!(paid["notes"].is_null());

    // Gated actions need a session
    client
        .post(&format!("/lessons/{}/access", course.paid_lesson))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    db::delete_users(&state.pool, &[tutor.id])
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_purchase_unlocks_paid_lesson() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    let learner = db::create_learner(&state.pool).await.expect("learner");
    let course = paid_course(&state.pool, tutor.id).await;
    let client = TestClient::for_state(&state);
    let access_uri = format!("/lessons/{}/access", course.paid_lesson);

    let denied = client.post_with_auth(&access_uri, &learner.token()).await;
    denied.assert_status(StatusCode::FORBIDDEN);
    let denied: Value = denied.json();
    assert!(denied["error"].as_str().unwrap_or_default().contains("not enrolled"));

    db::create_purchase(&state.pool, learner.id, course.course_id, 10_000)
        .await
        .expect("purchase");

    let allowed = client.post_with_auth(&access_uri, &learner.token()).await;
    allowed.assert_status(StatusCode::OK);
    let progress: Value = allowed.json();
    assert_eq!(progress["is_completed"], false);
    assert!(progress["last_accessed_at"].is_string());

    let detail: Value = client
        .get_with_auth(&format!("/lessons/{}", course.paid_lesson), &learner.token())
        .await
        .json();
    assert_eq!(detail["has_access"], true);

    db::delete_users(&state.pool, &[learner.id, tutor.id])
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_course_owner_needs_no_purchase() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    let course = paid_course(&state.pool, tutor.id).await;
    let client = TestClient::for_state(&state);

    client
        .post_with_auth(&format!("/lessons/{}/access", course.paid_lesson), &tutor.token())
        .await
        .assert_status(StatusCode::OK);

    db::delete_users(&state.pool, &[tutor.id])
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_suspended_user_rejected() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    let suspended = db::create_user(&state.pool, "LEARNER", "SUSPENDED")
        .await
        .expect("suspended learner");
    let course = paid_course(&state.pool, tutor.id).await;
    let client = TestClient::for_state(&state);

    client
        .post_with_auth(
            &format!("/lessons/{}/access", course.preview_lesson),
            &suspended.token(),
        )
        .await
        .assert_status(StatusCode::FORBIDDEN);

    db::delete_users(&state.pool, &[suspended.id, tutor.id])
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_draft_lessons_hidden_from_public() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    let learner = db::create_learner(&state.pool).await.expect("learner");
    let course_id = db::create_draft_course(&state.pool, tutor.id, Some(10_000))
        .await
        .expect("course");
    let chapter = db::create_chapter(&state.pool, course_id, 0).await.expect("chapter");
    let lesson_id = db::create_lesson(&state.pool, chapter, 0, "VIDEO", true)
        .await
        .expect("lesson");

    let client = TestClient::for_state(&state);
    let uri = format!("/lessons/{lesson_id}");

    client.get(&uri).await.assert_status(StatusCode::NOT_FOUND);
    client
        .get_with_auth(&uri, &learner.token())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let own = client.get_with_auth(&uri, &tutor.token()).await;
    own.assert_status(StatusCode::OK);
    let own: Value = own.json();
    assert_eq!(own["course_id"], course_id.to_string());

    db::delete_users(&state.pool, &[learner.id, tutor.id])
        .await
        .expect("Failed to cleanup database");
}
