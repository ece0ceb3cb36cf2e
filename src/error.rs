//! Error types for the Lector server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::annotate::AnnotateError;
use crate::ocr::OcrError;
use crate::storage::StorageError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Annotation error: {0}")]
    Annotate(#[from] AnnotateError),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Storage(e) => match e {
                StorageError::NotFound(name) => {
                    (StatusCode::NOT_FOUND, "not_found", format!("File not found: {}", name))
                }
                StorageError::InvalidName(name) => {
                    (StatusCode::BAD_REQUEST, "bad_request", format!("Invalid filename: {}", name))
                }
                StorageError::Io(_) => {
                    tracing::error!("Storage error: {}", e);
                    (e.status_code(), "storage_error", "Storage error".to_string())
                }
            },
            AppError::Ocr(e) => {
                tracing::error!("OCR error: {}", e);
                (e.status_code(), "ocr_error", e.to_string())
            }
            AppError::Annotate(e) => match e {
                AnnotateError::Unreadable { .. } => (
                    StatusCode::BAD_REQUEST,
                    "bad_request",
                    "Uploaded file is not a readable image".to_string(),
                ),
                _ => {
                    tracing::error!("Annotation error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "annotation_error",
                        "Failed to write annotated image".to_string(),
                    )
                }
            },
            AppError::Multipart(e) => (StatusCode::BAD_REQUEST, "bad_request", e.body_text()),
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    "IO error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
