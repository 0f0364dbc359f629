//! Error types for the user registry
//!
//! All errors use thiserror for structured error handling.
//! Every error renders as a JSON body carrying a numeric `status`
//! that mirrors the HTTP status code.

use crate::validation::ValidationErrors;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub const CONSENT_REQUIRED_MESSAGE: &str = "Consent must be true when uploading an image!";
pub const USER_NOT_FOUND_MESSAGE: &str = "No such user found!";
pub const NO_RECORDS_MESSAGE: &str = "No records found!";
pub const FILE_NOT_FOUND_MESSAGE: &str = "No such file found!";
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong!";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob store error: {0}")]
    BlobStore(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{}", CONSENT_REQUIRED_MESSAGE)]
    ConsentRequired,

    #[error("{}", USER_NOT_FOUND_MESSAGE)]
    UserNotFound,

    #[error("{}", NO_RECORDS_MESSAGE)]
    NoRecords,

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    #[error("Record store returned no created user")]
    CreateFailed,

    #[error("Malformed multipart body: {0}")]
    Multipart(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConsentRequired | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound | Self::NoRecords | Self::BlobNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Database(_)
            | Self::Io(_)
            | Self::BlobStore(_)
            | Self::CreateFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        let status = self.status_code().as_u16();
        match self {
            Self::Validation(errors) => json!({ "status": status, "errors": errors }),
            Self::ConsentRequired => json!({ "status": status, "errors": CONSENT_REQUIRED_MESSAGE }),
            Self::Multipart(reason) => json!({ "status": status, "errors": reason }),
            Self::UserNotFound => json!({ "status": status, "message": USER_NOT_FOUND_MESSAGE }),
            Self::NoRecords => json!({ "status": status, "message": NO_RECORDS_MESSAGE }),
            Self::BlobNotFound(_) => json!({ "status": status, "message": FILE_NOT_FOUND_MESSAGE }),
            _ => json!({ "status": status, "message": GENERIC_FAILURE_MESSAGE }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status.as_u16(), self);
        }
        (status, Json(self.body())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::ConsentRequired.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NoRecords.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::CreateFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Validation(ValidationErrors::default()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let body = AppError::BlobStore("disk full".to_string()).body();
        assert_eq!(body["status"], 500);
        assert_eq!(body["message"], GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_consent_body_uses_errors_key() {
        let body = AppError::ConsentRequired.body();
        assert_eq!(body["status"], 400);
        assert_eq!(body["errors"], CONSENT_REQUIRED_MESSAGE);
    }
}
