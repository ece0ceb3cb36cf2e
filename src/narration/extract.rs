//! Narration text extraction
//!
//! Camera photos carry a header and side UI the reader is not interested
//! in, so the image is cropped, binarized and cleaned before being read
//! under several page segmentation modes. Whatever the modes agree to
//! read is joined into one normalized ASCII string.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;

use crate::ocr::{OcrError, TesseractEngine};

/// Page segmentation modes tried in order: uniform block, single word, raw line
pub const NARRATION_PSM_MODES: [u32; 3] = [6, 8, 13];

const CROP_TOP: f32 = 0.20;
const CROP_BOTTOM: f32 = 0.95;
const CROP_LEFT: f32 = 0.05;
const CROP_RIGHT: f32 = 0.95;

/// Pre-threshold blur (5x5 kernel equivalent)
const BLUR_SIGMA: f32 = 1.1;
/// Gaussian window for the local threshold (11x11 block equivalent)
const THRESHOLD_SIGMA: f32 = 2.0;
/// Subtracted from the local mean
const THRESHOLD_OFFSET: f32 = 2.0;

/// Reads plain text from a preprocessed image
#[async_trait]
pub trait TextReader: Send + Sync {
    async fn read_text(&self, image: &GrayImage, psm: u32) -> Result<String, OcrError>;
}

#[async_trait]
impl TextReader for TesseractEngine {
    async fn read_text(&self, image: &GrayImage, psm: u32) -> Result<String, OcrError> {
        TesseractEngine::read_text(self, image, psm).await
    }
}

/// Extraction error types
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Could not read image: {0}")]
    Unreadable(#[from] image::ImageError),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Narration text extractor
#[derive(Clone)]
pub struct TextExtractor {
    reader: Arc<dyn TextReader>,
    psm_modes: Vec<u32>,
}

impl TextExtractor {
    pub fn new(reader: Arc<dyn TextReader>) -> Self {
        Self {
            reader,
            psm_modes: NARRATION_PSM_MODES.to_vec(),
        }
    }

    /// Extract text from an image file.
    ///
    /// Returns `Ok(None)` when no mode read any text.
    pub async fn extract(&self, path: &Path) -> Result<Option<String>, ExtractError> {
        let path = path.to_path_buf();
        let prepared = tokio::task::spawn_blocking(move || -> Result<GrayImage, ExtractError> {
            let image = image::open(&path)?.to_rgb8();
            Ok(preprocess(&image))
        })
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))??;

        let mut pieces = Vec::new();
        for psm in &self.psm_modes {
            match self.reader.read_text(&prepared, *psm).await {
                Ok(text) if !text.trim().is_empty() => pieces.push(text.trim().to_string()),
                Ok(_) => {}
                Err(e) => tracing::debug!(psm = psm, error = %e, "Segmentation mode failed"),
            }
        }

        let text = clean_text(&pieces.join(" "));
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }
}

/// Crop, binarize and clean an image for text reading
pub fn preprocess(image: &RgbImage) -> GrayImage {
    let cropped = crop_reading_area(image);
    let gray = imageops::grayscale(&cropped);
    let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
    let binary = adaptive_threshold(&blurred, THRESHOLD_SIGMA, THRESHOLD_OFFSET);

    // 3x3 square structuring element
    let closed = morphology::close(&binary, Norm::LInf, 1);
    morphology::open(&closed, Norm::LInf, 1)
}

fn crop_reading_area(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let top = (height as f32 * CROP_TOP) as u32;
    let bottom = (height as f32 * CROP_BOTTOM) as u32;
    let left = (width as f32 * CROP_LEFT) as u32;
    let right = (width as f32 * CROP_RIGHT) as u32;

    if bottom <= top || right <= left {
        return image.clone();
    }
    imageops::crop_imm(image, left, top, right - left, bottom - top).to_image()
}

/// Binarize against a Gaussian-weighted local mean minus `offset`
fn adaptive_threshold(image: &GrayImage, sigma: f32, offset: f32) -> GrayImage {
    let local_mean = gaussian_blur_f32(image, sigma);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y)[0] as f32;
        let threshold = local_mean.get_pixel(x, y)[0] as f32 - offset;
        if value > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Collapse whitespace and drop non-ASCII characters
pub fn clean_text(text: &str) -> String {
    let ascii: String = text.chars().filter(char::is_ascii).collect();
    ascii.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mock reader for testing
#[cfg(test)]
pub struct MockReader {
    /// Reply per segmentation mode; missing modes fail
    pub replies: std::collections::HashMap<u32, String>,
}

#[cfg(test)]
#[async_trait]
impl TextReader for MockReader {
    async fn read_text(&self, _image: &GrayImage, psm: u32) -> Result<String, OcrError> {
        self.replies
            .get(&psm)
            .cloned()
            .ok_or_else(|| OcrError::ProcessingError(format!("no reply for psm {}", psm)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    fn reader(replies: &[(u32, &str)]) -> Arc<dyn TextReader> {
        Arc::new(MockReader {
            replies: replies.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        })
    }

    fn write_photo(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("ESP32_202501011200_00.png");
        RgbImage::from_fn(100, 80, |x, _| {
            if x % 10 < 3 {
                Rgb([0, 0, 0])
            } else {
                Rgb([230, 230, 230])
            }
        })
        .save(&path)
        .unwrap();
        path
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Hello\n\n  world \u{2014} ok\t"), "Hello world ok");
        assert_eq!(clean_text("caf\u{e9}"), "caf");
        assert_eq!(clean_text(" \n "), "");
    }

    #[test]
    fn test_preprocess_crops_and_binarizes() {
        let image = RgbImage::from_pixel(100, 80, Rgb([200, 200, 200]));
        let prepared = preprocess(&image);

        assert_eq!(prepared.dimensions(), (90, 60));
        assert!(prepared.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // Flat regions sit above mean - offset
        assert!(prepared.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_tiny_image_is_not_cropped_away() {
        let image = RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]));
        assert_eq!(preprocess(&image).dimensions(), (1, 1));
    }

    #[tokio::test]
    async fn test_extract_joins_modes_and_skips_failures() {
        let dir = TempDir::new().unwrap();
        let photo = write_photo(dir.path());

        let extractor = TextExtractor::new(reader(&[(6, "Chapter  One\n"), (13, " the end ")]));
        let text = extractor.extract(&photo).await.unwrap();

        assert_eq!(text.as_deref(), Some("Chapter One the end"));
    }

    #[tokio::test]
    async fn test_extract_without_text_is_none() {
        let dir = TempDir::new().unwrap();
        let photo = write_photo(dir.path());

        let extractor = TextExtractor::new(reader(&[(6, "  "), (8, "\u{2022}")]));
        assert_eq!(extractor.extract(&photo).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_extract_unreadable_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"nope").unwrap();

        let extractor = TextExtractor::new(reader(&[(6, "text")]));
        assert!(matches!(
            extractor.extract(&path).await,
            Err(ExtractError::Unreadable(_))
        ));
    }
}
