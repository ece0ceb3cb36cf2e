//! Pipeline Coordinator
//!
//! Sequences the recognition passes, spelling review, deduplication and
//! annotation for one image. Passes run one after another in fixed method
//! order so results are reproducible.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;

use super::types::{HighlightReport, SpellCheckReport};
use crate::annotate::{AnnotateError, Annotator, ArtifactManifest};
use crate::dedup::deduplicate;
use crate::ocr::{run_pass, Detection, DetectionFilter, Engine, Method, OcrEngine, Orientation};
use crate::orientation::{self, Rotation};
use crate::review::{extract_errors, group_by_method, SpellReviewer};

/// Coordinates the multi-engine spell-check and keyword-highlight flows
#[derive(Clone)]
pub struct PipelineCoordinator {
    paddle: Arc<dyn OcrEngine>,
    tesseract: Arc<dyn OcrEngine>,
    reviewer: Arc<dyn SpellReviewer>,
    annotator: Arc<Annotator>,
}

impl PipelineCoordinator {
    pub fn new(
        paddle: Arc<dyn OcrEngine>,
        tesseract: Arc<dyn OcrEngine>,
        reviewer: Arc<dyn SpellReviewer>,
        annotator: Arc<Annotator>,
    ) -> Self {
        Self {
            paddle,
            tesseract,
            reviewer,
            annotator,
        }
    }

    fn engine(&self, engine: Engine) -> &dyn OcrEngine {
        match engine {
            Engine::Paddle => self.paddle.as_ref(),
            Engine::Tesseract => self.tesseract.as_ref(),
        }
    }

    /// Engines that pass their availability check
    async fn available_engines(&self) -> Vec<Engine> {
        let mut available = Vec::with_capacity(2);
        for engine in [Engine::Paddle, Engine::Tesseract] {
            if self.engine(engine).is_available().await {
                available.push(engine);
            } else {
                tracing::warn!(engine = %engine, "OCR engine unavailable, skipping its passes");
            }
        }
        available
    }

    async fn pass(
        &self,
        available: &[Engine],
        method: Method,
        frame: &RgbImage,
        filter: &DetectionFilter,
    ) -> Vec<Detection> {
        if !available.contains(&method.engine) {
            return Vec::new();
        }
        run_pass(self.engine(method.engine), frame, method.orientation, filter).await
    }

    /// Run all four passes over an image, in `Method::ALL` order.
    ///
    /// An unavailable engine contributes empty passes.
    pub async fn recognize_all(&self, image: &RgbImage, filter: &DetectionFilter) -> Vec<(Method, Vec<Detection>)> {
        let available = self.available_engines().await;
        let rotation = Rotation::SECONDARY_PASS;
        let rotated = orientation::rotate(image, rotation);
        tracing::debug!(
            degrees = rotation.degrees(),
            width = rotated.width(),
            height = rotated.height(),
            "Prepared rotated frame"
        );

        let mut passes = Vec::with_capacity(Method::ALL.len());
        for method in Method::ALL {
            let frame = match method.orientation {
                Orientation::Original => image,
                Orientation::Rotated => &rotated,
            };
            let detections = self.pass(&available, method, frame, filter).await;
            passes.push((method, detections));
        }
        passes
    }

    /// Spell-check one image and write its annotated artifacts.
    ///
    /// Never fails: an unreadable image yields an empty report with
    /// `failure` set.
    pub async fn spell_check(
        &self,
        image_path: &Path,
        image_index: usize,
        output_path: Option<&Path>,
    ) -> SpellCheckReport {
        let image = match decode(image_path).await {
            Ok(image) => image,
            Err(e) => {
                tracing::error!(image = %image_path.display(), error = %e, "Cannot spell-check image");
                return SpellCheckReport {
                    failure: Some(e.to_string()),
                    ..SpellCheckReport::default()
                };
            }
        };

        tracing::info!(
            image = %image_path.display(),
            width = image.width(),
            height = image.height(),
            "Starting spell check"
        );

        let passes = self.recognize_all(&image, &DetectionFilter::NonEmpty).await;
        let outcome = extract_errors(self.reviewer.as_ref(), &passes, image_index).await;

        let errors = deduplicate(outcome.flatten());
        let grouped = group_by_method(&errors);

        let annotator = Arc::clone(&self.annotator);
        let path = image_path.to_path_buf();
        let output = output_path.map(Path::to_path_buf);
        let artifacts = tokio::task::spawn_blocking(move || {
            annotator.annotate_all(&path, &grouped, image_index, output.as_deref())
        })
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Annotation task failed");
            ArtifactManifest::default()
        });

        tracing::info!(
            image = %image_path.display(),
            errors = errors.len(),
            artifacts = artifacts.len(),
            "Spell check complete"
        );

        SpellCheckReport {
            error_count: errors.len(),
            errors,
            raw_responses: outcome.raw_responses,
            detections: passes.into_iter().collect::<BTreeMap<_, _>>(),
            artifacts,
            image_size: Some(image.dimensions()),
            failure: None,
        }
    }

    /// Outline detections containing any of `words` and save the result
    pub async fn keyword_highlight(
        &self,
        image_path: &Path,
        words: &[String],
        output_path: &Path,
    ) -> Result<HighlightReport, AnnotateError> {
        let image = decode(image_path).await?;
        let filter = DetectionFilter::keywords(words);

        let available = self.available_engines().await;
        let paddle = self.pass(&available, Method::PADDLE_ORIGINAL, &image, &filter).await;
        let tesseract = self.pass(&available, Method::TESSERACT_ORIGINAL, &image, &filter).await;

        tracing::info!(
            image = %image_path.display(),
            keywords = words.len(),
            paddle = paddle.len(),
            tesseract = tesseract.len(),
            "Keyword matches found"
        );

        let report = HighlightReport {
            paddle_matches: paddle.len(),
            tesseract_matches: tesseract.len(),
            output_path: output_path.to_path_buf(),
        };

        let annotator = Arc::clone(&self.annotator);
        let output: PathBuf = output_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let matches: Vec<Detection> = paddle.into_iter().chain(tesseract).collect();
            let highlighted = annotator.highlight(&image, &matches);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            highlighted.save(&output).map_err(|source| AnnotateError::Save {
                path: output.display().to_string(),
                source,
            })
        })
        .await
        .map_err(|e| AnnotateError::Io(std::io::Error::other(e)))??;

        Ok(report)
    }
}

async fn decode(path: &Path) -> Result<RgbImage, AnnotateError> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        image::open(&owned)
            .map(|image| image.to_rgb8())
            .map_err(|source| AnnotateError::Unreadable {
                path: owned.display().to_string(),
                source,
            })
    })
    .await
    .map_err(|e| AnnotateError::Io(std::io::Error::other(e)))?
}
