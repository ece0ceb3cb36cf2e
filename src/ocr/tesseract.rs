//! Tesseract engine
//!
//! Runs the `tesseract` binary on a temporary PNG. Word-level regions come
//! from TSV output; plain text (used by the narration flow) from the default
//! text renderer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{GrayImage, RgbImage};
use tokio::process::Command;

use super::provider::{encode_png, OcrEngine};
use super::types::{ConfidenceScale, Engine, Geometry, OcrError, RawDetection};

/// TSV row level for individual words
const WORD_LEVEL: i32 = 5;

/// Tesseract OCR engine
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, language: &str) -> Self {
        Self {
            binary: binary.into(),
            language: language.to_string(),
        }
    }

    /// Run tesseract with the given page segmentation mode on an image.
    ///
    /// `renderer` is appended as the output config (e.g. `tsv`); `None`
    /// yields plain text.
    async fn run(&self, png: &[u8], psm: u32, renderer: Option<&str>) -> Result<String, OcrError> {
        let input_path = std::env::temp_dir().join(format!("ocr_input_{}.png", uuid::Uuid::new_v4()));

        tokio::fs::write(&input_path, png)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to write temp file: {}", e)))?;

        let result = self.invoke(&input_path, psm, renderer).await;

        let _ = tokio::fs::remove_file(&input_path).await;

        result
    }

    async fn invoke(&self, input: &Path, psm: u32, renderer: Option<&str>) -> Result<String, OcrError> {
        let mut command = Command::new(&self.binary);
        command
            .arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(psm.to_string());
        if let Some(renderer) = renderer {
            command.arg(renderer);
        }

        let output = command
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    OcrError::EngineNotAvailable(format!("tesseract not found at {}", self.binary.display()))
                }
                _ => OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Plain-text recognition of a preprocessed grayscale image
    pub async fn read_text(&self, image: &GrayImage, psm: u32) -> Result<String, OcrError> {
        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| OcrError::ImageEncoding(format!("Failed to encode PNG: {}", e)))?;
        self.run(&png, psm, None).await
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn engine(&self) -> Engine {
        Engine::Tesseract
    }

    fn confidence_scale(&self) -> ConfidenceScale {
        ConfidenceScale::Percent
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, image: &RgbImage) -> Result<Vec<RawDetection>, OcrError> {
        let png = encode_png(image)?;
        let tsv = self.run(&png, 3, Some("tsv")).await?;
        Ok(parse_tsv_words(&tsv))
    }
}

/// Parse word rows out of tesseract TSV output.
///
/// Rows that are not words, have too few columns, or carry blank text are
/// skipped. Confidence is kept on tesseract's 0-100 scale (`-1` for rows
/// tesseract could not score).
pub fn parse_tsv_words(tsv: &str) -> Vec<RawDetection> {
    let mut words = Vec::new();

    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 && row.starts_with("level") {
            continue;
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let level: i32 = cols[0].trim().parse().unwrap_or(0);
        if level != WORD_LEVEL {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        let left: i32 = cols[6].trim().parse().unwrap_or(0);
        let top: i32 = cols[7].trim().parse().unwrap_or(0);
        let width: u32 = cols[8].trim().parse().unwrap_or(0);
        let height: u32 = cols[9].trim().parse().unwrap_or(0);
        let conf: Option<f64> = cols[10].trim().parse().ok();

        words.push(RawDetection {
            text: text.to_string(),
            confidence: conf,
            geometry: Geometry::Box {
                left,
                top,
                width,
                height,
            },
        });
    }

    words
}
