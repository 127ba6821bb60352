use axum::http::StatusCode;
use serde_json::Value;

use crate::common::{TestClient, TestStateBuilder, db};

#[tokio::test]
async fn test_tutor_analytics_zero_filled() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    db::create_course(&state.pool, tutor.id, Some(4_000))
        .await
        .expect("course");

    let client = TestClient::for_state(&state);
    let response = client.get_with_auth("/tutor/analytics", &tutor.token()).await;

    response.assert_status(StatusCode::OK);
    let analytics: Value = response.json();
    assert_eq!(analytics["total_revenue"], 0);
    assert_eq!(analytics["total_students"], 0);
    assert_eq!(analytics["total_courses"], 1);

    let revenue = analytics["revenue_by_month"].as_array().cloned().unwrap_or_default();
    assert_eq!(revenue.len(), 6);
    assert!(revenue.iter().all(|point| point["value"] == 0));
    assert_eq!(analytics["per_course"][0]["students"], 0);
    assert_eq!(analytics["per_course"][0]["completion_rate"], 0.0);
    assert_eq!(analytics["recent_enrollments"].as_array().map(Vec::len), Some(0));

    db::delete_users(&state.pool, &[tutor.id])
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_tutor_analytics_counts_purchases() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let tutor = db::create_tutor(&state.pool).await.expect("tutor");
    let learners = [
        db::create_learner(&state.pool).await.expect("learner"),
        db::create_learner(&state.pool).await.expect("learner"),
    ];
    let course_id = db::create_course(&state.pool, tutor.id, Some(4_000))
        .await
        .expect("course");
    for learner in &learners {
        db::create_purchase(&state.pool, learner.id, course_id, 4_000)
            .await
            .expect("purchase");
    }

    let client = TestClient::for_state(&state);
    let analytics: Value = client
        .get_with_auth("/tutor/analytics", &tutor.token())
        .await
        .json();

    assert_eq!(analytics["total_revenue"], 8_000);
    assert_eq!(analytics["total_students"], 2);
    assert_eq!(analytics["revenue_by_month"][5]["value"], 8_000);
    assert_eq!(analytics["enrollments_by_month"][5]["value"], 2);
    assert_eq!(analytics["recent_enrollments"].as_array().map(Vec::len), Some(2));

    let mut ids = vec![tutor.id];
    ids.extend(learners.iter().map(|l| l.id));
    db::delete_users(&state.pool, &ids)
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_learner_cannot_view_tutor_analytics() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let learner = db::create_learner(&state.pool).await.expect("learner");

    let client = TestClient::for_state(&state);
    client
        .get_with_auth("/tutor/analytics", &learner.token())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    db::delete_users(&state.pool, &[learner.id])
        .await
        .expect("Failed to cleanup database");
}

#[tokio::test]
async fn test_leaderboard_orders_by_points() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let leader = db::create_learner(&state.pool).await.expect("learner");
    let runner_up = db::create_learner(&state.pool).await.expect("learner");

    // Far above anything other tests award
    for (user, points) in [(&runner_up, 1_000_000_000_i64), (&leader, 1_000_000_001)] {
        sqlx::query("INSERT INTO user_points (user_id, points) VALUES ($1, $2)")
            .bind(user.id)
            .bind(points)
            .execute(&state.pool)
            .await
            .expect("points");
    }

    let client = TestClient::for_state(&state);
    let response = client.get("/leaderboard?limit=2").await;

    response.assert_status(StatusCode::OK);
    let board: Value = response.json();
    let leader_id = leader.id.to_string();
    let runner_up_id = runner_up.id.to_string();
    assert_eq!(board[0]["rank"], 1);
    assert_eq!(board[0]["user_id"], leader_id.as_str());
    assert_eq!(board[1]["rank"], 2);
    assert_eq!(board[1]["user_id"], runner_up_id.as_str());

    db::delete_users(&state.pool, &[leader.id, runner_up.id])
        .await
        .expect("Failed to cleanup database");
}
