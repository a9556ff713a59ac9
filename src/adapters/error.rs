use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::application::error::ApplicationError;

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApplicationError::NotFound => {
                warn!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            ApplicationError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            ApplicationError::PayloadTooLarge => {
                warn!("Request body too large");
                (StatusCode::PAYLOAD_TOO_LARGE, "File too large".to_string())
            }
            ApplicationError::UnsupportedMediaType(msg) => {
                warn!("Unsupported media type: {}", msg);
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg)
            }
            ApplicationError::StorageUnavailable(msg) => {
                error!("Storage backend failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApplicationError::InternalError(ref msg) => {
                error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
