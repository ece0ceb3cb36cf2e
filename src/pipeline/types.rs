//! Pipeline report types

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::annotate::ArtifactManifest;
use crate::ocr::{Coordinates, Detection, Method};
use crate::orientation::Rotation;
use crate::review::ErrorRecord;

/// Result of a spell-check run over one image
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpellCheckReport {
    /// Unique errors in fixed method order
    pub errors: Vec<ErrorRecord>,
    pub error_count: usize,
    /// Raw reviewer reply (or failure text) per method name
    pub raw_responses: BTreeMap<String, String>,
    /// Detections of every pass, keyed by method
    pub detections: BTreeMap<Method, Vec<Detection>>,
    pub artifacts: ArtifactManifest,
    /// `(width, height)` of the decoded source image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<(u32, u32)>,
    /// Why the image could not be decoded, if it could not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SpellCheckReport {
    /// Where `record` sits on the source image.
    ///
    /// Rotated passes report coordinates in the rotated frame; those are
    /// mapped back. Original-frame records are returned unchanged.
    pub fn original_coordinates(&self, record: &ErrorRecord) -> Coordinates {
        match self.image_size {
            Some(size) if record.method.is_rotated() => Rotation::SECONDARY_PASS.to_original(record.coordinates, size),
            _ => record.coordinates,
        }
    }
}

/// Result of a keyword-highlight run
#[derive(Debug, Clone, Serialize)]
pub struct HighlightReport {
    pub paddle_matches: usize,
    pub tesseract_matches: usize,
    pub output_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(x: i32, y: i32, method: Method) -> ErrorRecord {
        ErrorRecord {
            word: "teh".to_string(),
            coordinates: Coordinates { x, y },
            method,
            image_index: 0,
        }
    }

    #[test]
    fn test_rotated_coordinates_map_back_to_source() {
        let report = SpellCheckReport {
            image_size: Some((200, 100)),
            ..SpellCheckReport::default()
        };

        // (20, 50) in the 100x200 rotated frame is (149, 20) on the source
        assert_eq!(
            report.original_coordinates(&record(20, 50, Method::PADDLE_ROTATED)),
            Coordinates { x: 149, y: 20 }
        );
        assert_eq!(
            report.original_coordinates(&record(20, 50, Method::TESSERACT_ORIGINAL)),
            Coordinates { x: 20, y: 50 }
        );
    }

    #[test]
    fn test_unknown_size_keeps_reported_coordinates() {
        let report = SpellCheckReport::default();
        assert_eq!(
            report.original_coordinates(&record(20, 50, Method::TESSERACT_ROTATED)),
            Coordinates { x: 20, y: 50 }
        );
    }
}
