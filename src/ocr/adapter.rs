//! OCR Adapter
//!
//! Runs one recognition pass and normalizes its output into [`Detection`]s
//! tagged with the pass's [`Method`].

use image::RgbImage;

use super::provider::OcrEngine;
use super::types::{
    ConfidenceScale, Detection, DetectionFilter, Method, Orientation, RawDetection,
};

/// Normalize a raw confidence onto [0, 1].
///
/// Percentage-scale values are divided by 100; non-positive values become 0.
pub fn normalize_confidence(raw: Option<f64>, scale: ConfidenceScale) -> Option<f64> {
    let value = raw?;
    if !value.is_finite() || value <= 0.0 {
        return Some(0.0);
    }
    let normalized = match scale {
        ConfidenceScale::Unit => value,
        ConfidenceScale::Percent => value / 100.0,
    };
    Some(normalized.min(1.0))
}

impl DetectionFilter {
    /// Build a keyword filter, dropping blank keywords
    pub fn keywords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Keywords(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        )
    }

    pub fn accepts(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        match self {
            Self::NonEmpty => true,
            Self::Keywords(words) => {
                let lower = text.to_lowercase();
                words.iter().any(|w| lower.contains(w.as_str()))
            }
        }
    }
}

/// Normalize raw detections from one pass
pub fn normalize(
    raw: Vec<RawDetection>,
    method: Method,
    scale: ConfidenceScale,
    filter: &DetectionFilter,
) -> Vec<Detection> {
    raw.into_iter()
        .filter(|d| filter.accepts(&d.text))
        .map(|d| Detection {
            anchor: d.geometry.anchor(),
            confidence: normalize_confidence(d.confidence, scale),
            text: d.text,
            geometry: d.geometry,
            method,
        })
        .collect()
}

/// Run one (engine, orientation) pass.
///
/// `image` must already be in the pass's orientation. Engine failures are
/// logged and produce an empty result so the remaining passes still run.
pub async fn run_pass(
    engine: &dyn OcrEngine,
    image: &RgbImage,
    orientation: Orientation,
    filter: &DetectionFilter,
) -> Vec<Detection> {
    let method = Method::new(engine.engine(), orientation);

    match engine.recognize(image).await {
        Ok(raw) => {
            let total = raw.len();
            let detections = normalize(raw, method, engine.confidence_scale(), filter);
            tracing::debug!(
                method = %method,
                raw = total,
                kept = detections.len(),
                "OCR pass complete"
            );
            detections
        }
        Err(e) => {
            tracing::warn!(method = %method, error = %e, "OCR pass failed, continuing without it");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::provider::MockEngine;
    use crate::ocr::types::{Engine, Geometry, Point};

    fn word(text: &str, confidence: Option<f64>) -> RawDetection {
        RawDetection {
            text: text.to_string(),
            confidence,
            geometry: Geometry::Box {
                left: 10,
                top: 20,
                width: 30,
                height: 10,
            },
        }
    }

    #[test]
    fn test_confidence_normalization() {
        assert_eq!(normalize_confidence(Some(0.42), ConfidenceScale::Unit), Some(0.42));
        assert_eq!(normalize_confidence(Some(91.0), ConfidenceScale::Percent), Some(0.91));
        assert_eq!(normalize_confidence(Some(-1.0), ConfidenceScale::Percent), Some(0.0));
        assert_eq!(normalize_confidence(Some(0.0), ConfidenceScale::Unit), Some(0.0));
        assert_eq!(normalize_confidence(None, ConfidenceScale::Percent), None);
    }

    #[test]
    fn test_keyword_filter_is_case_insensitive_substring() {
        let filter = DetectionFilter::keywords(["teh", "  ", "FOX"]);
        assert!(filter.accepts("Teh"));
        assert!(filter.accepts("Tehran"));
        assert!(filter.accepts("foxes"));
        assert!(!filter.accepts("quick"));
        assert!(!filter.accepts("   "));
    }

    #[test]
    fn test_keyword_filter_without_keywords_matches_nothing() {
        let filter = DetectionFilter::keywords(Vec::<String>::new());
        assert!(!filter.accepts("anything"));
    }

    #[test]
    fn test_normalize_tags_method_and_drops_blank_text() {
        let raw = vec![word("Teh", Some(90.0)), word("  ", Some(50.0))];
        let detections = normalize(
            raw,
            Method::TESSERACT_ORIGINAL,
            ConfidenceScale::Percent,
            &DetectionFilter::NonEmpty,
        );

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].method, Method::TESSERACT_ORIGINAL);
        assert_eq!(detections[0].confidence, Some(0.9));
        assert_eq!(detections[0].anchor.x, 10);
    }

    #[tokio::test]
    async fn test_run_pass_swallows_engine_failure() {
        let mut engine = MockEngine::new(Engine::Paddle, vec![word("Teh", Some(0.9))]);
        engine.fail = true;
        let image = RgbImage::new(40, 20);

        let detections =
            run_pass(&engine, &image, Orientation::Original, &DetectionFilter::NonEmpty).await;
        assert!(detections.is_empty());
    }

    #[tokio::test]
    async fn test_run_pass_polygon_centroid() {
        let raw = RawDetection {
            text: "Teh quick fox".to_string(),
            confidence: Some(0.97),
            geometry: Geometry::Polygon {
                points: [
                    Point::new(0.0, 0.0),
                    Point::new(100.0, 0.0),
                    Point::new(100.0, 20.0),
                    Point::new(0.0, 20.0),
                ],
            },
        };
        let engine = MockEngine::new(Engine::Paddle, vec![raw]);
        let image = RgbImage::new(200, 100);

        let detections = run_pass(
            &engine,
            &image,
            Orientation::Original,
            &DetectionFilter::keywords(["teh"]),
        )
        .await;

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].method, Method::PADDLE_ORIGINAL);
        assert_eq!((detections[0].anchor.x, detections[0].anchor.y), (50, 10));
    }
}
