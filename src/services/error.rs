use thiserror::Error;

use crate::application::error::ApplicationError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Storage provider error: {0}")]
    ProviderError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => ApplicationError::NotFound,
            StorageError::Unauthorized(_)
            | StorageError::NetworkError(_)
            | StorageError::ProviderError(_) => {
                ApplicationError::StorageUnavailable(error.to_string())
            }
            StorageError::InvalidCredentials(msg) | StorageError::InternalError(msg) => {
                ApplicationError::InternalError(format!("Storage error: {}", msg))
            }
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            StorageError::NetworkError("Request timeout".to_string())
        } else if error.is_connect() {
            StorageError::NetworkError(format!("Connection failed: {}", error))
        } else if let Some(status) = error.status() {
            match status.as_u16() {
                404 => StorageError::NotFound(error.to_string()),
                401 | 403 => StorageError::Unauthorized(error.to_string()),
                _ => StorageError::ProviderError(error.to_string()),
            }
        } else {
            StorageError::InternalError(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failures_surface_as_unavailable() {
        let err: ApplicationError = StorageError::ProviderError("List failed: boom".into()).into();
        assert!(matches!(
            err,
            ApplicationError::StorageUnavailable(ref msg) if msg == "Storage provider error: List failed: boom"
        ));

        let err: ApplicationError = StorageError::NotFound("bucket".into()).into();
        assert!(matches!(err, ApplicationError::NotFound));

        let err: ApplicationError = StorageError::InvalidCredentials("bad".into()).into();
        assert!(matches!(err, ApplicationError::InternalError(_)));
    }
}
