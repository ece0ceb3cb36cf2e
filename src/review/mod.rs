//! Spelling review
//!
//! Sends each OCR method's text to a language-model reviewer and extracts
//! probable misspellings with their coordinates.

mod client;
mod extractor;
mod types;

pub use client::{OllamaReviewer, SpellReviewer};
pub use extractor::{build_prompt, extract_errors, group_by_method, parse_reply, UNAVAILABLE_KEY};
pub use types::{ErrorRecord, MethodErrors, ReviewError, ReviewOutcome};

#[cfg(test)]
pub(crate) use client::MockReviewer;
