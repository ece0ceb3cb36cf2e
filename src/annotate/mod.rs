//! Annotation Module
//!
//! Renders spell-check findings and keyword matches onto images:
//! - one artifact per method that reported errors
//! - a combined overlay of all methods
//! - keyword-highlight images
//!
//! Rotated-method findings are drawn in the rotated frame and composited
//! back, so every artifact is in the original image's orientation.

mod bitmap;
mod compositor;
mod draw;
mod font;
mod types;

pub use compositor::{Annotator, AnnotatorConfig};
pub use draw::{BoxGeometry, ANNOTATION_COLOR};
pub use font::{LabelFont, DEFAULT_FONT_SIZE};
pub use types::{AnnotateError, ArtifactManifest, COMBINED_KEY};
