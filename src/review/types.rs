//! Review Types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ocr::{Coordinates, Method};

/// A probable misspelling reported by the review service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub word: String,
    /// Anchor in the frame of the method's image (rotated frame for rotated methods)
    pub coordinates: Coordinates,
    pub method: Method,
    /// Source image this error belongs to when several images share one pool
    pub image_index: usize,
}

/// Per-method error lists
pub type MethodErrors = BTreeMap<Method, Vec<ErrorRecord>>;

/// Outcome of reviewing all methods for one image
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewOutcome {
    /// Errors per method, only for methods whose review succeeded
    pub errors: MethodErrors,
    /// Raw reply (or failure reason) keyed by method name, or `error` when
    /// the service was unavailable
    pub raw_responses: BTreeMap<String, String>,
}

impl ReviewOutcome {
    /// All errors in fixed method order
    pub fn flatten(&self) -> Vec<ErrorRecord> {
        Method::ALL
            .iter()
            .filter_map(|m| self.errors.get(m))
            .flatten()
            .cloned()
            .collect()
    }
}

/// Review error types
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Review service not available: {0}")]
    NotAvailable(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Review service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),
}
