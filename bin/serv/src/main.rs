use std::net::SocketAddr;

use axum::{Router, routing::get};
use lms_api::{ApiConfig, ApiState, metrics, router, tracing::init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from .env and the process environment
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;

    init_tracing(&config.environment);
    let metrics_handle = metrics::init_metrics()?;

    // Create the database if needed and bring the schema up to date
    lms_db::ensure_database(&config.database_url).await?;
    let pool = lms_db::create_pool(&config.database_url, config.database_max_connections).await?;
    lms_db::migrate(&pool).await?;

    let state = ApiState::new(&config, pool)?;

    let metrics_app = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(metrics_handle);

    let app = router::router().with_state(state).merge(metrics_app);
    let app = router::with_http_layers(app, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.environment, "server listening");

    // Peer addresses feed the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
