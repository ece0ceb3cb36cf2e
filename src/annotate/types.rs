//! Annotation Types

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Manifest key of the combined overlay
pub const COMBINED_KEY: &str = "combined";

/// Written artifacts keyed by method name or `combined`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArtifactManifest {
    entries: BTreeMap<String, PathBuf>,
}

impl ArtifactManifest {
    pub fn insert(&mut self, name: &str, path: PathBuf) {
        self.entries.insert(name.to_string(), path);
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn combined(&self) -> Option<&Path> {
        self.get(COMBINED_KEY)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

/// Annotation error types
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("Could not read image {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to save {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
