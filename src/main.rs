mod adapters;
mod application;
mod domain;
mod services;

use std::process::ExitCode;

use axum::http::HeaderValue;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use adapters::state::AppState;
use domain::config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; real deployments set the variables directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dataset_service=info,tower_http=info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let port = config.local.port;
    tracing::info!(
        "Starting dataset-service with provider {:?}, bucket '{}', default folder '{}'",
        config.local.provider,
        config.local.bucket_name,
        config.local.default_folder
    );

    let cors = match &config.local.cors_allowed_origins {
        Some(allowed_origins) => {
            let mut origins: Vec<HeaderValue> = Vec::with_capacity(allowed_origins.len());
            for origin in allowed_origins {
                match origin.parse() {
                    Ok(origin) => origins.push(origin),
                    Err(_) => {
                        tracing::error!("Invalid CORS origin: {}", origin);
                        return ExitCode::FAILURE;
                    }
                }
            }
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        // Allow all origins if not specified (only for development)
        None => CorsLayer::permissive(),
    };

    let storage_service = match services::create_storage_service(&config.local, &config.secrets) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to create storage service: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let app_state = AppState::new(config, storage_service);

    let router = adapters::router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to port {}: {}", port, e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Server listening on 0.0.0.0:{}", port);

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
