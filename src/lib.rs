//! Lector Server
//!
//! Reads photographed pages aloud and cross-checks OCR engines for
//! spelling errors:
//! - Camera uploads are read with Tesseract and narrated to MP3
//! - Spell check runs two engines over two orientations, asks a language
//!   model for misspellings and writes annotated images per method
//! - Keyword highlight outlines matching words on an image

pub mod annotate;
pub mod config;
pub mod dedup;
pub mod error;
pub mod narration;
pub mod ocr;
pub mod orientation;
pub mod pipeline;
pub mod review;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::{AppState, Collaborators};
