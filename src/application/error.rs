use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Resource not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}
