//! Camera upload endpoint
//!
//! Stores the image under a timestamp name, records a `processing` job and
//! hands the image to the narration workers. Responds before any
//! processing happens.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use chrono::Local;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::narration::ProcessingJob;
use crate::state::AppState;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub filename: String,
    pub message: &'static str,
    pub processing_status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" {
            tracing::debug!(field = %name, "Ignoring multipart field");
            continue;
        }

        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
        }

        let storage = state.storage();
        let (filename, path) = storage.save_upload(&data, Local::now().naive_local()).await?;

        state.jobs().set(ProcessingJob::new(&filename)).await;
        state.workers().submit(filename.clone(), path);

        return Ok(Json(UploadResponse {
            status: "success",
            filename,
            message: "Image uploaded successfully. OCR and TTS processing started automatically.",
            processing_status: "started",
        }));
    }

    tracing::warn!("No file field found in multipart upload");
    Err(AppError::BadRequest("No file provided. Use field name 'file'".to_string()))
}
