//! Annotation compositor
//!
//! Each method's errors are drawn onto a transparent layer in the frame
//! that method's engine saw. Layers of rotated methods are rotated back,
//! then every layer is alpha-composited onto a fresh copy of the original
//! (the per-method artifact) and onto the combined overlay, in fixed method
//! order so later methods draw on top.

use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::{imageops, Rgba, RgbImage, RgbaImage};

use super::draw::{draw_error_box, draw_region, BoxGeometry, ANNOTATION_COLOR};
use super::font::{LabelFont, DEFAULT_FONT_SIZE};
use super::types::{AnnotateError, ArtifactManifest, COMBINED_KEY};
use crate::ocr::{Detection, Method};
use crate::orientation::{self, Rotation};
use crate::review::{ErrorRecord, MethodErrors};

/// Annotator configuration
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// Where artifacts are written
    pub output_dir: PathBuf,
    /// Preferred TTF font
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub geometry: BoxGeometry,
    pub color: Rgba<u8>,
    /// Also write `{base}_{method}_rotated.png` in the rotated frame
    pub save_rotated_frames: bool,
}

impl AnnotatorConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            font_path: None,
            font_size: DEFAULT_FONT_SIZE,
            geometry: BoxGeometry::default(),
            color: ANNOTATION_COLOR,
            save_rotated_frames: false,
        }
    }
}

/// Draws error and keyword annotations and writes them to disk
pub struct Annotator {
    config: AnnotatorConfig,
    font: LabelFont,
}

impl Annotator {
    pub fn new(config: AnnotatorConfig) -> Self {
        let font = LabelFont::load(config.font_path.as_deref(), config.font_size);
        Self { config, font }
    }

    pub fn with_font(config: AnnotatorConfig, font: LabelFont) -> Self {
        Self { config, font }
    }

    /// Annotate one image with the errors recorded for `image_index`.
    ///
    /// Writes `{base}_{method}.png` for every method with at least one
    /// error and the combined overlay to `output_path` (or
    /// `{base}_all_errors.png`). The combined overlay is always written.
    /// Any failure is logged and yields an empty manifest.
    pub fn annotate_all(
        &self,
        image_path: &Path,
        errors: &MethodErrors,
        image_index: usize,
        output_path: Option<&Path>,
    ) -> ArtifactManifest {
        match self.try_annotate_all(image_path, errors, image_index, output_path) {
            Ok(manifest) => {
                tracing::info!(
                    image = %image_path.display(),
                    artifacts = manifest.len(),
                    "Annotation complete"
                );
                manifest
            }
            Err(e) => {
                tracing::error!(image = %image_path.display(), error = %e, "Annotation failed");
                ArtifactManifest::default()
            }
        }
    }

    /// Annotate several images; errors are matched to images by position
    pub fn annotate_batch(&self, images: &[PathBuf], errors: &MethodErrors) -> Vec<ArtifactManifest> {
        images
            .iter()
            .enumerate()
            .map(|(index, path)| self.annotate_all(path, errors, index, None))
            .collect()
    }

    /// Outline keyword matches on a copy of `image`
    pub fn highlight(&self, image: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut canvas: RgbaImage = image.convert();
        for detection in detections {
            draw_region(&mut canvas, &detection.geometry, self.config.color);
        }
        canvas.convert()
    }

    fn try_annotate_all(
        &self,
        image_path: &Path,
        errors: &MethodErrors,
        image_index: usize,
        output_path: Option<&Path>,
    ) -> Result<ArtifactManifest, AnnotateError> {
        let source = image::open(image_path)
            .map_err(|source| AnnotateError::Unreadable {
                path: image_path.display().to_string(),
                source,
            })?
            .to_rgb8();
        let original: RgbaImage = source.convert();
        let base = base_name(image_path);

        let mut combined = original.clone();
        let mut manifest = ArtifactManifest::default();

        for method in Method::ALL {
            let records: Vec<&ErrorRecord> = errors
                .get(&method)
                .into_iter()
                .flatten()
                .filter(|r| r.image_index == image_index)
                .collect();
            if records.is_empty() {
                continue;
            }

            let rotation = rotation_for(method);
            let frame_size = rotation.rotated_size(original.dimensions());
            let frame_layer = self.draw_layer(frame_size, method, &records);

            if rotation != Rotation::None && self.config.save_rotated_frames {
                let mut frame = orientation::rotate(&original, rotation);
                imageops::overlay(&mut frame, &frame_layer, 0, 0);
                let path = self
                    .config
                    .output_dir
                    .join(format!("{}_{}_rotated.png", base, method.name()));
                save_rgb(&frame, &path)?;
                manifest.insert(&format!("{}_rotated", method.name()), path);
            }

            let layer = orientation::rotate_back(&frame_layer, rotation);

            let mut annotated = original.clone();
            imageops::overlay(&mut annotated, &layer, 0, 0);
            imageops::overlay(&mut combined, &layer, 0, 0);

            let path = self
                .config
                .output_dir
                .join(format!("{}_{}.png", base, method.name()));
            save_rgb(&annotated, &path)?;
            tracing::debug!(method = %method, errors = records.len(), path = %path.display(), "Saved method annotations");
            manifest.insert(method.name(), path);
        }

        let combined_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => self.config.output_dir.join(format!("{}_all_errors.png", base)),
        };
        save_rgb(&combined, &combined_path)?;
        manifest.insert(COMBINED_KEY, combined_path);

        Ok(manifest)
    }

    /// Transparent layer with one box and label per record, in the method's frame
    fn draw_layer(&self, (width, height): (u32, u32), method: Method, records: &[&ErrorRecord]) -> RgbaImage {
        let mut layer = RgbaImage::new(width, height);
        for record in records {
            let label = format!("{} ({})", record.word, method.prefix());
            draw_error_box(
                &mut layer,
                &self.font,
                &self.config.geometry,
                record.coordinates,
                &label,
                self.config.color,
            );
        }
        layer
    }
}

fn rotation_for(method: Method) -> Rotation {
    if method.is_rotated() {
        Rotation::SECONDARY_PASS
    } else {
        Rotation::None
    }
}

fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

fn save_rgb(image: &RgbaImage, path: &Path) -> Result<(), AnnotateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let rgb: RgbImage = image.convert();
    rgb.save(path).map_err(|source| AnnotateError::Save {
        path: path.display().to_string(),
        source,
    })
}
