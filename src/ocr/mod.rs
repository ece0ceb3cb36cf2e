//! OCR Module
//!
//! Provides the recognition passes that feed the spell-check and
//! keyword-highlight pipelines.
//!
//! Two engines are supported:
//! - PaddleOCR (hub-serving HTTP API, polygon regions)
//! - Tesseract (local binary, word boxes)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lector_server::ocr::{run_pass, DetectionFilter, Orientation, TesseractEngine};
//!
//! let engine = TesseractEngine::new("tesseract", "eng");
//! let detections = run_pass(&engine, &image, Orientation::Original, &DetectionFilter::NonEmpty).await;
//! ```

mod adapter;
mod paddle;
mod provider;
mod tesseract;
mod types;

pub use adapter::{normalize, normalize_confidence, run_pass};
pub use paddle::{parse_serving_response, PaddleEngine};
pub use provider::OcrEngine;
pub use tesseract::{parse_tsv_words, TesseractEngine};
pub use types::{
    ConfidenceScale, Coordinates, Detection, DetectionFilter, Engine, Geometry, Method, OcrError,
    Orientation, Point, RawDetection,
};

#[cfg(test)]
pub(crate) use provider::MockEngine;
