//! OCR Types
//!
//! Defines the engine/orientation tags and the detection records produced
//! by each recognition pass.

use std::fmt;

use serde::{Deserialize, Serialize};

/// OCR engine type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// PaddleOCR (polygon geometry, unit-scale confidence)
    Paddle,
    /// Tesseract (box geometry, percentage confidence)
    Tesseract,
}

impl Engine {
    /// Label prefix used on annotations
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paddle => "paddle",
            Self::Tesseract => "tesseract",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image orientation seen by a recognition pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Original,
    /// Rotated 90 degrees counter-clockwise with frame expansion
    Rotated,
}

/// An (engine, orientation) pair identifying one recognition pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Method {
    pub engine: Engine,
    pub orientation: Orientation,
}

impl Method {
    pub const PADDLE_ORIGINAL: Method = Method::new(Engine::Paddle, Orientation::Original);
    pub const TESSERACT_ORIGINAL: Method = Method::new(Engine::Tesseract, Orientation::Original);
    pub const PADDLE_ROTATED: Method = Method::new(Engine::Paddle, Orientation::Rotated);
    pub const TESSERACT_ROTATED: Method = Method::new(Engine::Tesseract, Orientation::Rotated);

    /// Fixed processing order. Determines dedup tie-breaks and draw order.
    pub const ALL: [Method; 4] = [
        Self::PADDLE_ORIGINAL,
        Self::TESSERACT_ORIGINAL,
        Self::PADDLE_ROTATED,
        Self::TESSERACT_ROTATED,
    ];

    pub const fn new(engine: Engine, orientation: Orientation) -> Self {
        Self { engine, orientation }
    }

    pub fn is_rotated(&self) -> bool {
        self.orientation == Orientation::Rotated
    }

    /// Wire name, e.g. `paddle_original`
    pub fn name(&self) -> &'static str {
        match (self.engine, self.orientation) {
            (Engine::Paddle, Orientation::Original) => "paddle_original",
            (Engine::Tesseract, Orientation::Original) => "tesseract_original",
            (Engine::Paddle, Orientation::Rotated) => "paddle_rotated",
            (Engine::Tesseract, Orientation::Rotated) => "tesseract_rotated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Short prefix shown in annotation labels
    pub fn prefix(&self) -> &'static str {
        self.engine.as_str()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Method {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Method::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown OCR method: {}", name)))
    }
}

/// Pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Integer anchor point of a detection or error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

/// Region geometry as reported by an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    /// Four corner points, in engine order
    Polygon { points: [Point; 4] },
    /// Axis-aligned box
    Box {
        left: i32,
        top: i32,
        width: u32,
        height: u32,
    },
}

impl Geometry {
    /// Anchor used for prompts and error coordinates.
    ///
    /// Polygons anchor at their centroid, boxes at their top-left corner.
    pub fn anchor(&self) -> Coordinates {
        match self {
            Self::Polygon { points } => {
                let x = points.iter().map(|p| p.x).sum::<f64>() / 4.0;
                let y = points.iter().map(|p| p.y).sum::<f64>() / 4.0;
                Coordinates {
                    x: x as i32,
                    y: y as i32,
                }
            }
            Self::Box { left, top, .. } => Coordinates { x: *left, y: *top },
        }
    }

    /// Corner points in drawing order
    pub fn corners(&self) -> [Point; 4] {
        match self {
            Self::Polygon { points } => *points,
            Self::Box {
                left,
                top,
                width,
                height,
            } => {
                let (l, t) = (*left as f64, *top as f64);
                let (r, b) = (l + *width as f64, t + *height as f64);
                [Point::new(l, t), Point::new(r, t), Point::new(r, b), Point::new(l, b)]
            }
        }
    }
}

/// Scale an engine reports confidences on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceScale {
    /// Already in [0, 1]
    Unit,
    /// 0-100
    Percent,
}

/// Unnormalized engine output for one region
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub text: String,
    pub confidence: Option<f64>,
    pub geometry: Geometry,
}

/// Normalized detection from one recognition pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub text: String,
    /// Confidence in [0, 1], `None` when the engine did not report one
    pub confidence: Option<f64>,
    /// Anchor in the frame of the image the engine saw
    pub anchor: Coordinates,
    pub geometry: Geometry,
    pub method: Method,
}

/// Which detections a pass keeps
#[derive(Debug, Clone)]
pub enum DetectionFilter {
    /// Every detection with non-blank text
    NonEmpty,
    /// Detections whose text contains any keyword (case-insensitive)
    Keywords(Vec<String>),
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("Failed to prepare image: {0}")]
    ImageEncoding(String),

    #[error("OCR processing failed: {0}")]
    ProcessingError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Malformed engine output: {0}")]
    MalformedOutput(String),
}

impl OcrError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::EngineNotAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names_round_trip() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.name()), Some(method));
        }
        assert_eq!(Method::from_name("easyocr_original"), None);
    }

    #[test]
    fn test_method_order_is_fixed() {
        let names: Vec<_> = Method::ALL.iter().map(|m| m.name()).collect();
        assert_eq!(
            names,
            vec![
                "paddle_original",
                "tesseract_original",
                "paddle_rotated",
                "tesseract_rotated"
            ]
        );
    }

    #[test]
    fn test_polygon_anchor_is_centroid() {
        let geometry = Geometry::Polygon {
            points: [
                Point::new(10.0, 20.0),
                Point::new(50.0, 20.0),
                Point::new(50.0, 40.0),
                Point::new(10.0, 40.0),
            ],
        };
        assert_eq!(geometry.anchor(), Coordinates { x: 30, y: 30 });
    }

    #[test]
    fn test_box_anchor_is_top_left() {
        let geometry = Geometry::Box {
            left: 7,
            top: 9,
            width: 40,
            height: 12,
        };
        assert_eq!(geometry.anchor(), Coordinates { x: 7, y: 9 });
        assert_eq!(geometry.corners()[2], Point::new(47.0, 21.0));
    }

    #[test]
    fn test_method_serializes_as_name() {
        let json = serde_json::to_string(&Method::TESSERACT_ROTATED).unwrap();
        assert_eq!(json, "\"tesseract_rotated\"");
        let back: Method = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Method::TESSERACT_ROTATED);
    }
}
