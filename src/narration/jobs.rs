//! Narration job records
//!
//! One record per uploaded image, keyed by its stored filename. Each
//! record is written by the upload handler once and then only by the
//! worker processing it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Overall job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    OcrCompleted,
    Completed,
    /// Text is available but no audio was produced
    OcrOnly,
    Error,
}

/// Audio generation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStatus {
    Pending,
    Generating,
    Completed,
    Failed,
    Skipped,
}

/// Processing state of one uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub filename: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_status: Option<AudioStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_timestamp: Option<DateTime<Utc>>,
}

impl ProcessingJob {
    /// New job in the `processing` state
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            status: JobStatus::Processing,
            text: None,
            audio_status: None,
            audio_path: None,
            audio_error: None,
            error: None,
            timestamp: Utc::now(),
            ocr_timestamp: None,
            audio_timestamp: None,
        }
    }

    /// Text extraction finished; audio is pending
    pub fn ocr_completed(&mut self, text: Option<String>) {
        self.status = JobStatus::OcrCompleted;
        self.text = text;
        self.ocr_timestamp = Some(Utc::now());
        self.audio_status = Some(AudioStatus::Pending);
    }

    pub fn audio_generating(&mut self) {
        self.audio_status = Some(AudioStatus::Generating);
    }

    pub fn audio_completed(&mut self, path: PathBuf) {
        self.status = JobStatus::Completed;
        self.audio_status = Some(AudioStatus::Completed);
        self.audio_path = Some(path);
        self.audio_timestamp = Some(Utc::now());
    }

    pub fn audio_failed(&mut self, reason: &str) {
        self.status = JobStatus::OcrOnly;
        self.audio_status = Some(AudioStatus::Failed);
        self.audio_error = Some(reason.to_string());
    }

    pub fn audio_skipped(&mut self, reason: &str) {
        self.status = JobStatus::OcrOnly;
        self.audio_status = Some(AudioStatus::Skipped);
        self.audio_error = Some(reason.to_string());
    }

    pub fn failed(&mut self, error: &str) {
        self.status = JobStatus::Error;
        self.error = Some(error.to_string());
        self.timestamp = Utc::now();
    }

    /// Whether text extraction has finished (successfully or not)
    pub fn is_text_ready(&self) -> bool {
        !matches!(self.status, JobStatus::Processing | JobStatus::Error)
    }
}

/// Job status persistence
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get(&self, filename: &str) -> Option<ProcessingJob>;

    /// Insert or replace the job under its filename
    async fn set(&self, job: ProcessingJob);

    /// All jobs, oldest first
    async fn list(&self) -> Vec<ProcessingJob>;

    async fn contains(&self, filename: &str) -> bool {
        self.get(filename).await.is_some()
    }
}

/// In-memory job store
#[derive(Clone, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<String, ProcessingJob>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn get(&self, filename: &str) -> Option<ProcessingJob> {
        let jobs = self.jobs.read().await;
        jobs.get(filename).cloned()
    }

    async fn set(&self, job: ProcessingJob) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.filename.clone(), job);
    }

    async fn list(&self) -> Vec<ProcessingJob> {
        let jobs = self.jobs.read().await;
        let mut all: Vec<ProcessingJob> = jobs.values().cloned().collect();
        all.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let mut job = ProcessingJob::new("ESP32_202501011200_00.jpg");
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "processing");
        assert!(json.get("text").is_none());

        job.ocr_completed(Some("hello".to_string()));
        job.audio_skipped("No valid text for audio generation");
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "ocr_only");
        assert_eq!(json["audio_status"], "skipped");
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn test_text_ready() {
        let mut job = ProcessingJob::new("a.jpg");
        assert!(!job.is_text_ready());
        job.ocr_completed(None);
        assert!(job.is_text_ready());
        job.failed("boom");
        assert!(!job.is_text_ready());
    }

    #[tokio::test]
    async fn test_store_set_get_list() {
        let store = InMemoryJobStore::new();
        assert!(store.get("a.jpg").await.is_none());

        store.set(ProcessingJob::new("b.jpg")).await;
        store.set(ProcessingJob::new("a.jpg")).await;

        let mut job = store.get("b.jpg").await.unwrap();
        job.ocr_completed(Some("text".to_string()));
        store.set(job).await;

        assert!(store.contains("a.jpg").await);
        let all = store.list().await;
        assert_eq!(all.len(), 2);
        assert_eq!(store.get("b.jpg").await.unwrap().status, JobStatus::OcrCompleted);
    }
}
