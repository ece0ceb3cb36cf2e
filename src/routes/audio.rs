//! Audio download endpoints

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::{file_response, StatusMessage};
use crate::error::Result;
use crate::state::AppState;
use crate::storage::Area;

const NO_AUDIO_MESSAGE: &str = "No audio files found";

#[derive(Debug, Serialize)]
pub struct LatestAudioResponse {
    pub filename: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/audio/:filename", get(get_audio))
        .route("/tts/:filename", get(get_audio))
        .route("/latest-audio", get(get_latest_audio))
        .route("/latest-audio-filename", get(get_latest_audio_filename))
}

async fn get_audio(State(state): State<AppState>, Path(filename): Path<String>) -> Result<Response> {
    let path = state.storage().resolve(Area::Audio, &filename).await?;
    file_response(&path, "attachment").await
}

async fn get_latest_audio(State(state): State<AppState>) -> Result<Response> {
    match state.storage().latest_audio().await? {
        Some(path) => file_response(&path, "attachment").await,
        None => Ok(StatusMessage::not_found(NO_AUDIO_MESSAGE)),
    }
}

async fn get_latest_audio_filename(State(state): State<AppState>) -> Result<Response> {
    let Some(path) = state.storage().latest_audio().await? else {
        return Ok(StatusMessage::not_found(NO_AUDIO_MESSAGE));
    };

    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Json(LatestAudioResponse { filename }).into_response())
}
