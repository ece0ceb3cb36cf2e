//! OCR Engines
//!
//! Defines the engine trait every recognition backend implements.

use async_trait::async_trait;
use image::RgbImage;

use super::types::{ConfidenceScale, Engine, OcrError, RawDetection};

/// OCR engine trait
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Get the engine type
    fn engine(&self) -> Engine;

    /// Scale the engine reports confidences on
    fn confidence_scale(&self) -> ConfidenceScale {
        ConfidenceScale::Unit
    }

    /// Check if the engine is reachable
    async fn is_available(&self) -> bool;

    /// Recognize text regions in an image.
    ///
    /// An image without text yields an empty vector, not an error.
    async fn recognize(&self, image: &RgbImage) -> Result<Vec<RawDetection>, OcrError>;
}

/// Encode an image as PNG bytes for engines that take encoded input
pub(crate) fn encode_png(image: &RgbImage) -> Result<Vec<u8>, OcrError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| OcrError::ImageEncoding(format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer)
}

/// Mock engine for testing
#[cfg(test)]
pub struct MockEngine {
    pub engine: Engine,
    pub scale: ConfidenceScale,
    /// Detections returned for landscape (original) and portrait (rotated) input
    pub original: Vec<RawDetection>,
    pub rotated: Vec<RawDetection>,
    pub available: bool,
    pub fail: bool,
}

#[cfg(test)]
impl MockEngine {
    pub fn new(engine: Engine, original: Vec<RawDetection>) -> Self {
        Self {
            engine,
            scale: ConfidenceScale::Unit,
            original,
            rotated: Vec::new(),
            available: true,
            fail: false,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl OcrEngine for MockEngine {
    fn engine(&self) -> Engine {
        self.engine
    }

    fn confidence_scale(&self) -> ConfidenceScale {
        self.scale
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self, image: &RgbImage) -> Result<Vec<RawDetection>, OcrError> {
        if self.fail {
            return Err(OcrError::ProcessingError("mock failure".to_string()));
        }
        if image.width() >= image.height() {
            Ok(self.original.clone())
        } else {
            Ok(self.rotated.clone())
        }
    }
}
