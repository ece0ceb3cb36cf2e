//! Narration status endpoints
//!
//! Clients poll these after an upload until text (and audio) are ready.
//! `/ocr-result*` are kept as aliases for older clients.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::StatusMessage;
use crate::narration::{JobStatus, ProcessingJob};
use crate::state::AppState;
use crate::storage::Area;

const NOT_FOUND_MESSAGE: &str = "Processing result not found for this filename";

/// Job record plus artifact existence checks
#[derive(Debug, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: ProcessingJob,
    pub image_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_exists: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub filename: String,
    pub text: String,
    pub status: JobStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/processing-result/:filename", get(get_processing_result))
        .route("/processing-results", get(list_processing_results))
        .route("/ocr-result/:filename", get(get_processing_result))
        .route("/ocr-results", get(list_processing_results))
        .route("/text/:filename", get(get_text))
}

async fn job_view(state: &AppState, job: ProcessingJob) -> JobView {
    let image_exists = state.storage().exists(Area::Uploads, &job.filename).await;
    let audio_exists = match &job.audio_path {
        Some(path) => Some(tokio::fs::metadata(path).await.is_ok()),
        None => None,
    };
    JobView {
        job,
        image_exists,
        audio_exists,
    }
}

async fn get_processing_result(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    match state.jobs().get(&filename).await {
        Some(job) => Json(job_view(&state, job).await).into_response(),
        None => StatusMessage::not_found(NOT_FOUND_MESSAGE),
    }
}

async fn list_processing_results(State(state): State<AppState>) -> Json<BTreeMap<String, JobView>> {
    let mut results = BTreeMap::new();
    for job in state.jobs().list().await {
        let filename = job.filename.clone();
        results.insert(filename, job_view(&state, job).await);
    }
    Json(results)
}

async fn get_text(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let Some(job) = state.jobs().get(&filename).await else {
        return StatusMessage::not_found(NOT_FOUND_MESSAGE);
    };

    if !job.is_text_ready() {
        return Json(StatusMessage {
            status: "not_ready",
            message: "Text extraction not yet completed".to_string(),
        })
        .into_response();
    }

    Json(TextResponse {
        filename,
        text: job.text.unwrap_or_default(),
        status: job.status,
        timestamp: job.ocr_timestamp,
    })
    .into_response()
}
