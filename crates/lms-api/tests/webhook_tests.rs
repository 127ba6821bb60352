use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::common::{TestClient, TestStateBuilder, db, sign};

fn charge_success(reference: &str, amount: i64, email: &str, course_id: Uuid) -> Vec<u8> {
    json!({
        "event": "charge.success",
        "data": {
            "reference": reference,
            "amount": amount,
            "status": "success",
            "customer": { "email": email },
            "metadata": { "courseId": course_id.to_string() }
        }
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn test_payment_webhook_missing_signature() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);

    let body = charge_success("pay_unsigned", 1_000, "nobody@example.com", Uuid::new_v4());
    let response = client.post_raw("/webhooks/payments", &body, &[]).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_webhook_bad_signature() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);

    let body = charge_success("pay_forged", 1_000, "nobody@example.com", Uuid::new_v4());
    let forged = sign::paystack(b"a different body");
    let response = client
        .post_raw("/webhooks/payments", &body, &[("x-paystack-signature", forged)])
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_payment_webhook_enrolls_once() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    let learner = db::create_learner(&state.pool).await.expect("learner");
    let course_id = db::create_course(&state.pool, tutor.id, Some(15_000))
        .await
        .expect("course");

    let client = TestClient::for_state(&state);
    let reference = format!("pay_{}", Uuid::new_v4().simple());
    let body = charge_success(&reference, 15_000, &learner.email, course_id);
    let signature = sign::paystack(&body);

    for _ in 0..2 {
        let response = client
            .post_raw(
                "/webhooks/payments",
                &body,
                &[("x-paystack-signature", signature.clone())],
            )
            .await;
        response.assert_status(StatusCode::OK);
        let ack: Value = response.json();
        assert_eq!(ack["received"], true);
    }

    assert_eq!(
        db::count_purchases(&state.pool, learner.id, course_id)
            .await
            .expect("count"),
        1
    );
    let (stored_reference,): (String,) =
        sqlx::query_as("SELECT reference FROM purchases WHERE user_id = $1 AND course_id = $2")
            .bind(learner.id)
            .bind(course_id)
            .fetch_one(&state.pool)
            .await
            .expect("purchase");
    assert_eq!(stored_reference, reference);

    db::delete_users(&state.pool, &[learner.id, tutor.id])
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_underpaid_webhook_acknowledged_without_purchase() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    let learner = db::create_learner(&state.pool).await.expect("learner");
    let course_id = db::create_course(&state.pool, tutor.id, Some(15_000))
        .await
        .expect("course");

    let client = TestClient::for_state(&state);
    let body = charge_success(
        &format!("pay_{}", Uuid::new_v4().simple()),
        14_999,
        &learner.email,
        course_id,
    );
    let signature = sign::paystack(&body);
    let response = client
        .post_raw("/webhooks/payments", &body, &[("x-paystack-signature", signature)])
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(
        db::count_purchases(&state.pool, learner.id, course_id)
            .await
            .expect("count"),
        0
    );

    db::delete_users(&state.pool, &[learner.id, tutor.id])
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_identity_webhook_creates_then_deletes_user() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);

    let external_id = format!("user_{}", Uuid::new_v4().simple());
    let email = crate::common::test_data::unique_email("identity");

    let created = json!({
        "type": "user.created",
        "data": {
            "id": external_id,
            "email_addresses": [{ "id": "idn_1", "email_address": email }],
            "primary_email_address_id": "idn_1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "image_url": null
        }
    })
    .to_string()
    .into_bytes();
    let deleted = json!({ "type": "user.deleted", "data": { "id": external_id } })
        .to_string()
        .into_bytes();

    for (message_id, body) in [("msg_created", &created), ("msg_deleted", &deleted)] {
        let timestamp = Utc::now().timestamp();
        let response = client
            .post_raw(
                "/webhooks/identity",
                body,
                &[
                    ("svix-id", message_id.to_string()),
                    ("svix-timestamp", timestamp.to_string()),
                    ("svix-signature", sign::svix(message_id, timestamp, body)),
                ],
            )
            .await;
        response.assert_status(StatusCode::OK);

        let stored: Option<(String,)> =
            sqlx::query_as("SELECT name FROM users WHERE external_id = $1")
                .bind(&external_id)
                .fetch_optional(&state.pool)
                .await
                .expect("user lookup");
        if message_id == "msg_created" {
            assert_eq!(stored.map(|r| r.0).as_deref(), Some("Ada Lovelace"));
        } else {
            assert!(stored.is_none());
        }
    }
}

#[tokio::test]
async fn test_identity_webhook_stale_timestamp_rejected() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);

    let body = br#"{"type":"user.deleted","data":{"id":"user_stale"}}"#;
    let timestamp = Utc::now().timestamp() - 3_600;
    let response = client
        .post_raw(
            "/webhooks/identity",
            body,
            &[
                ("svix-id", "msg_stale".to_string()),
                ("svix-timestamp", timestamp.to_string()),
                ("svix-signature", sign::svix("msg_stale", timestamp, body)),
            ],
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_video_webhook_for_unknown_lesson_acknowledged() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);

    let body = json!({
        "type": "video.asset.ready",
        "data": {
            "id": "asset_123",
            "status": "ready",
            "passthrough": Uuid::new_v4().to_string(),
            "playback_ids": [{ "id": "play_123", "policy": "public" }]
        }
    })
    .to_string()
    .into_bytes();
    let timestamp = Utc::now().timestamp();
    let response = client
        .post_raw(
            "/webhooks/video",
            &body,
            &[("mux-signature", sign::mux(timestamp, &body))],
        )
        .await;

    response.assert_status(StatusCode::OK);
}
