//! Route modules for Lector Server

pub mod annotator;
pub mod audio;
pub mod health;
pub mod results;
pub mod upload;

use std::path::Path;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::storage::content_type;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/health", health::router())
        .merge(upload::router())
        .merge(results::router())
        .merge(audio::router())
        .nest("/annotator", annotator::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `{status, message}` body used for lookups that found nothing
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
    pub message: String,
}

impl StatusMessage {
    pub fn not_found(message: &str) -> Response {
        (
            StatusCode::NOT_FOUND,
            Json(StatusMessage {
                status: "not_found",
                message: message.to_string(),
            }),
        )
            .into_response()
    }
}

/// Stream a stored file back with its guessed content type
pub(crate) async fn file_response(path: &Path, disposition: &str) -> Result<Response> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type(path))
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("{}; filename=\"{}\"", disposition, filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}
