use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pinhole_core::ShortenerError;
use tracing::{debug, error};

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures as the client sees them. Details stay in the logs.
#[derive(Debug)]
pub enum AppError {
    NotFound,
    BadRequest(String),
    Internal,
}

impl From<ShortenerError> for AppError {
    fn from(error: ShortenerError) -> Self {
        match error {
            ShortenerError::OutOfRange(_)
            | ShortenerError::NotFound(_) => {
                debug!(error = %error, "short code not found");
                AppError::NotFound
            }
            ShortenerError::InvalidUrl(message) => AppError::BadRequest(message),
            ShortenerError::DomainExhausted
            | ShortenerError::Corrupted(_)
            | ShortenerError::Storage(_) => {
                error!(error = %error, "request failed");
                AppError::Internal
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "404 page not found").into_response(),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            AppError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
