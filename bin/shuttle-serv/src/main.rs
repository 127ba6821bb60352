use axum::{Router, routing::get};
use lms_api::{ApiConfig, ApiState, metrics, router};

#[shuttle_runtime::main]
async fn main(
    #[shuttle_shared_db::Postgres] pool: sqlx::PgPool,
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    let config = ApiConfig::from_shuttle_secrets(&secrets)
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    // Shuttle installs its own tracing subscriber
    let metrics_handle = metrics::init_metrics()?;

    sqlx::migrate!("../../crates/lms-db/migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration error: {e}"))?;

    let state = ApiState::new(&config, pool)?;

    let metrics_app = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(metrics_handle);

    let app = router::router().with_state(state).merge(metrics_app);
    let app = router::with_http_layers(app, &config);

    tracing::info!(environment = ?config.environment, "tutorhub api ready");

    Ok(app.into())
}
