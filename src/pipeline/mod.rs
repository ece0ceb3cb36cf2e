//! Spell-check and keyword-highlight pipelines
//!
//! ```text
//! image ─┬─ paddle / original ───┐
//!        ├─ tesseract / original ├─ review ─ dedup ─ annotate
//!        ├─ paddle / rotated ────┤
//!        └─ tesseract / rotated ─┘
//! ```

mod coordinator;
mod types;

pub use coordinator::PipelineCoordinator;
pub use types::{HighlightReport, SpellCheckReport};
