use std::net::SocketAddr;
use std::time::Duration;

use axum::Json;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::sqlite::SqlitePoolOptions;
use tower::{BoxError, ServiceBuilder, timeout::TimeoutLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursetrack_backend::api;
use coursetrack_backend::response::Envelope;
use coursetrack_backend::state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "coursetrack_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://coursetrack.db?mode=rwc".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState { db: pool.clone() };

    let app = api::router(state).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
    );

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    pool.close().await;
    Ok(())
}

async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(Envelope::<()>::failure(
                "requestTimeout",
                "Request timed out".to_string(),
                None,
            )),
        )
            .into_response()
    } else {
        tracing::error!("middleware error: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope::<()>::failure(
                "internalServerError",
                "Internal server error".to_string(),
                None,
            )),
        )
            .into_response()
    }
}
