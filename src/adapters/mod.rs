pub mod controllers;
pub mod dto;
pub mod error;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use controllers::{file_controller::FileController, health_controller::HealthController};
use state::AppState;

async fn hello_world() -> &'static str {
    "Hello, world!"
}

pub fn router(app_state: AppState) -> Router {
    let body_limit = app_state.global_config.body_limit();

    Router::new()
        .route("/", get(hello_world))
        .route("/api/v1/health", get(HealthController::health_check))
        .route(
            "/api/v1/files",
            get(FileController::list_files).post(FileController::upload_files),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}
