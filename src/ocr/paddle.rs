//! PaddleOCR engine
//!
//! Talks to a PaddleOCR hub-serving instance (`/predict/ocr_system`), which
//! returns one polygon per recognized text line.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use image::RgbImage;
use serde::Deserialize;

use super::provider::{encode_png, OcrEngine};
use super::types::{Engine, Geometry, OcrError, Point, RawDetection};

/// PaddleOCR serving engine
pub struct PaddleEngine {
    /// Serving base URL
    base_url: String,
    client: reqwest::Client,
}

impl PaddleEngine {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServingResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    results: Vec<Vec<ServingLine>>,
}

#[derive(Debug, Deserialize)]
struct ServingLine {
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
    text_region: Vec<[f64; 2]>,
}

#[async_trait]
impl OcrEngine for PaddleEngine {
    fn engine(&self) -> Engine {
        Engine::Paddle
    }

    async fn is_available(&self) -> bool {
        // Serving answers GET on the predict route with 405; any HTTP reply means it is up
        let url = format!("{}/predict/ocr_system", self.base_url);
        self.client.get(&url).send().await.is_ok()
    }

    async fn recognize(&self, image: &RgbImage) -> Result<Vec<RawDetection>, OcrError> {
        let png = encode_png(image)?;
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(png);

        let url = format!("{}/predict/ocr_system", self.base_url);
        let request = serde_json::json!({ "images": [image_base64] });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    OcrError::EngineNotAvailable(format!("PaddleOCR at {}: {}", self.base_url, e))
                } else {
                    OcrError::ApiError(format!("Failed to call PaddleOCR: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "PaddleOCR returned {}: {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to read response: {}", e)))?;

        parse_serving_response(&body)
    }
}

/// Parse a hub-serving reply into raw detections.
///
/// Lines whose region is not a quadrilateral are dropped.
pub fn parse_serving_response(body: &str) -> Result<Vec<RawDetection>, OcrError> {
    let parsed: ServingResponse = serde_json::from_str(body)
        .map_err(|e| OcrError::MalformedOutput(format!("Invalid PaddleOCR response: {}", e)))?;

    if let Some(status) = parsed.status.as_deref() {
        if status != "000" && status != "0" {
            return Err(OcrError::ApiError(format!(
                "PaddleOCR status {}: {}",
                status,
                parsed.msg.unwrap_or_default()
            )));
        }
    }

    let detections = parsed
        .results
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|line| {
            let region: [[f64; 2]; 4] = line.text_region.try_into().ok()?;
            Some(RawDetection {
                text: line.text,
                confidence: line.confidence,
                geometry: Geometry::Polygon {
                    points: region.map(|[x, y]| Point::new(x, y)),
                },
            })
        })
        .collect();

    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serving_response() {
        let body = r#"{
            "msg": "",
            "status": "000",
            "results": [[
                {"confidence": 0.98, "text": "Teh quick fox",
                 "text_region": [[10, 20], [210, 20], [210, 60], [10, 60]]},
                {"confidence": 0.5, "text": "bad", "text_region": [[1, 1], [2, 2]]}
            ]]
        }"#;

        let detections = parse_serving_response(body).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].text, "Teh quick fox");
        assert_eq!(detections[0].confidence, Some(0.98));
        assert_eq!(detections[0].geometry.anchor().x, 110);
    }

    #[test]
    fn test_parse_empty_results() {
        let detections = parse_serving_response(r#"{"status": "000", "results": [[]]}"#).unwrap();
        assert!(detections.is_empty());

        let detections = parse_serving_response(r#"{"results": []}"#).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_parse_error_status() {
        let result = parse_serving_response(r#"{"status": "101", "msg": "bad image"}"#);
        assert!(matches!(result, Err(OcrError::ApiError(_))));
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_serving_response("<html>");
        assert!(matches!(result, Err(OcrError::MalformedOutput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_available() {
        let engine = PaddleEngine::new("http://127.0.0.1:9", Duration::from_secs(1));
        assert!(!engine.is_available().await);

        let result = engine.recognize(&RgbImage::new(8, 8)).await;
        assert!(matches!(result, Err(OcrError::EngineNotAvailable(_))));
    }
}
