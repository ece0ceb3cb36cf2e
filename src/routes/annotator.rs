//! Image annotator endpoints
//!
//! - `POST /process_image`: outline words matching a comma-separated list
//! - `POST /spell_check_image`: multi-engine spell check with annotated output
//! - `GET /files/:filename`: download an annotated image

use std::collections::BTreeMap;
use std::path::Path as FsPath;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::file_response;
use super::upload::MAX_UPLOAD_BYTES;
use crate::error::{AppError, Result};
use crate::ocr::Coordinates;
use crate::review::ErrorRecord;
use crate::state::AppState;
use crate::storage::Area;

#[derive(Debug, Serialize)]
pub struct ProcessImageResponse {
    pub paddle_results: usize,
    pub tesseract_results: usize,
    pub filename: String,
}

/// Error record plus its position on the uploaded image
#[derive(Debug, Serialize)]
pub struct ReportedError {
    #[serde(flatten)]
    pub record: ErrorRecord,
    pub original_coordinates: Coordinates,
}

#[derive(Debug, Serialize)]
pub struct SpellCheckResponse {
    pub errors: Vec<ReportedError>,
    pub error_count: usize,
    /// Combined overlay, downloadable from `/annotator/files/`
    pub filename: Option<String>,
    pub raw_llm_response: BTreeMap<String, String>,
    /// Artifact name (method or `combined`) to downloadable filename
    pub artifacts: BTreeMap<String, String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/process_image", post(process_image))
        .route("/spell_check_image", post(spell_check_image))
        .route("/files/:filename", get(get_annotated_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Uploaded image plus optional keyword list
struct ImageForm {
    filename: String,
    data: Bytes,
    words: Vec<String>,
}

impl ImageForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut image: Option<(String, Bytes)> = None;
        let mut words = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "image" => {
                    let filename = field.file_name().unwrap_or("").to_string();
                    let data = field.bytes().await?;
                    image = Some((filename, data));
                }
                "words" => {
                    let text = field.text().await?;
                    words = parse_words(&text);
                }
                other => tracing::debug!(field = %other, "Ignoring multipart field"),
            }
        }

        let Some((filename, data)) = image else {
            return Err(AppError::BadRequest("No image uploaded".to_string()));
        };
        if filename.is_empty() {
            return Err(AppError::BadRequest("No image selected".to_string()));
        }
        if data.is_empty() {
            return Err(AppError::BadRequest("Uploaded image is empty".to_string()));
        }

        Ok(Self { filename, data, words })
    }
}

/// Split a comma-separated keyword list, dropping blanks
fn parse_words(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn stem_of(filename: &str) -> String {
    FsPath::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}

fn file_name_of(path: &FsPath) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn process_image(State(state): State<AppState>, multipart: Multipart) -> Result<Json<ProcessImageResponse>> {
    let form = ImageForm::read(multipart).await?;
    let storage = state.storage();
    let (stored, path) = storage.save_named(Area::Uploads, &form.filename, &form.data).await?;

    let output_name = format!("annotated_{}.png", stem_of(&stored));
    let output = storage.path_of(Area::Annotated, &output_name)?;

    let report = state
        .pipeline()
        .keyword_highlight(&path, &form.words, &output)
        .await?;

    Ok(Json(ProcessImageResponse {
        paddle_results: report.paddle_matches,
        tesseract_results: report.tesseract_matches,
        filename: output_name,
    }))
}

async fn spell_check_image(State(state): State<AppState>, multipart: Multipart) -> Result<Json<SpellCheckResponse>> {
    let form = ImageForm::read(multipart).await?;
    let storage = state.storage();
    let (stored, path) = storage.save_named(Area::Uploads, &form.filename, &form.data).await?;

    let output_name = format!("spell_checked_{}.png", stem_of(&stored));
    let output = storage.path_of(Area::Annotated, &output_name)?;

    let report = state.pipeline().spell_check(&path, 0, Some(&output)).await;
    if report.failure.is_some() {
        return Err(AppError::BadRequest("Uploaded file is not a readable image".to_string()));
    }

    let artifacts: BTreeMap<String, String> = report
        .artifacts
        .iter()
        .map(|(name, path)| (name.to_string(), file_name_of(path)))
        .collect();
    let filename = report.artifacts.combined().map(file_name_of);
    let errors = report
        .errors
        .iter()
        .map(|record| ReportedError {
            original_coordinates: report.original_coordinates(record),
            record: record.clone(),
        })
        .collect();

    Ok(Json(SpellCheckResponse {
        errors,
        error_count: report.error_count,
        filename,
        raw_llm_response: report.raw_responses,
        artifacts,
    }))
}

async fn get_annotated_file(State(state): State<AppState>, Path(filename): Path<String>) -> Result<Response> {
    let path = state.storage().resolve(Area::Annotated, &filename).await?;
    file_response(&path, "inline").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words() {
        assert_eq!(parse_words(" invoice, total ,,  "), vec!["invoice", "total"]);
        assert!(parse_words("").is_empty());
    }

    #[test]
    fn test_stem_of() {
        assert_eq!(stem_of("scan_1.jpg"), "scan_1");
        assert_eq!(stem_of("noext"), "noext");
    }
}
