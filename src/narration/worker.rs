//! Narration workers
//!
//! Uploads are processed in the background: extract text, then synthesize
//! speech, updating the job record after each step. A semaphore bounds
//! how many images are processed at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::extract::TextExtractor;
use super::jobs::{JobStore, ProcessingJob};
use super::tts::SpeechSynthesizer;

/// Default number of images processed concurrently
pub const DEFAULT_WORKERS: usize = 3;

const NO_TEXT_REASON: &str = "No valid text for audio generation";
const AUDIO_FAILED_REASON: &str = "Audio generation failed";

/// Image → text → speech flow for one upload
pub struct NarrationPipeline {
    extractor: TextExtractor,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    jobs: Arc<dyn JobStore>,
    audio_dir: PathBuf,
    language: String,
}

impl NarrationPipeline {
    pub fn new(
        extractor: TextExtractor,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        jobs: Arc<dyn JobStore>,
        audio_dir: impl Into<PathBuf>,
        language: &str,
    ) -> Self {
        Self {
            extractor,
            synthesizer,
            jobs,
            audio_dir: audio_dir.into(),
            language: language.to_string(),
        }
    }

    /// Process one stored upload, recording progress under `filename`
    pub async fn process(&self, filename: &str, image_path: &Path) {
        tracing::info!(filename = %filename, "Starting narration");

        let mut job = self
            .jobs
            .get(filename)
            .await
            .unwrap_or_else(|| ProcessingJob::new(filename));

        let text = match self.extractor.extract(image_path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(filename = %filename, error = %e, "Text extraction failed");
                job.failed(&e.to_string());
                self.jobs.set(job).await;
                return;
            }
        };

        job.ocr_completed(text.clone());
        self.jobs.set(job.clone()).await;
        tracing::info!(
            filename = %filename,
            chars = text.as_ref().map(|t| t.len()).unwrap_or(0),
            "Text extracted"
        );

        let Some(text) = text else {
            tracing::warn!(filename = %filename, "No text detected, skipping audio");
            job.audio_skipped(NO_TEXT_REASON);
            self.jobs.set(job).await;
            return;
        };

        job.audio_generating();
        self.jobs.set(job.clone()).await;

        let output = self.audio_dir.join(format!("{}.mp3", audio_base(filename)));
        match self.synthesizer.synthesize(&text, &self.language, &output).await {
            Ok(path) => {
                tracing::info!(filename = %filename, audio = %path.display(), "Narration complete");
                job.audio_completed(path);
            }
            Err(e) => {
                tracing::warn!(filename = %filename, error = %e, "Audio generation failed");
                job.audio_failed(AUDIO_FAILED_REASON);
            }
        }
        self.jobs.set(job).await;
    }
}

fn audio_base(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

/// Bounded pool running narration jobs on the tokio runtime
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    pipeline: Arc<NarrationPipeline>,
}

impl WorkerPool {
    pub fn new(pipeline: Arc<NarrationPipeline>, workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
            pipeline,
        }
    }

    /// Queue an upload; returns immediately
    pub fn submit(&self, filename: String, image_path: PathBuf) -> JoinHandle<()> {
        let permits = Arc::clone(&self.permits);
        let pipeline = Arc::clone(&self.pipeline);

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                tracing::warn!(filename = %filename, "Worker pool closed, dropping job");
                return;
            };
            pipeline.process(&filename, &image_path).await;
        })
    }

    /// Workers currently idle
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::extract::MockReader;
    use crate::narration::jobs::{AudioStatus, InMemoryJobStore, JobStatus};
    use crate::narration::tts::MockSynthesizer;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        jobs: Arc<InMemoryJobStore>,
        synthesizer: Arc<MockSynthesizer>,
    }

    impl Fixture {
        fn new(fail_audio: bool) -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                jobs: Arc::new(InMemoryJobStore::new()),
                synthesizer: Arc::new(MockSynthesizer::new(fail_audio)),
            }
        }

        fn pipeline(&self, reply: Option<&str>) -> NarrationPipeline {
            let replies = reply.map(|r| (6, r.to_string())).into_iter().collect();
            let extractor = TextExtractor::new(Arc::new(MockReader { replies }));
            NarrationPipeline::new(
                extractor,
                self.synthesizer.clone(),
                self.jobs.clone(),
                self.dir.path().join("output_audio"),
                "en",
            )
        }

        fn photo(&self) -> PathBuf {
            let path = self.dir.path().join("ESP32_202501011200_05.jpg");
            RgbImage::from_pixel(64, 64, Rgb([240, 240, 240])).save(&path).unwrap();
            path
        }
    }

    #[tokio::test]
    async fn test_text_and_audio_complete() {
        let fixture = Fixture::new(false);
        let photo = fixture.photo();
        fixture.jobs.set(ProcessingJob::new("ESP32_202501011200_05.jpg")).await;

        fixture
            .pipeline(Some("Once upon a time"))
            .process("ESP32_202501011200_05.jpg", &photo)
            .await;

        let job = fixture.jobs.get("ESP32_202501011200_05.jpg").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.audio_status, Some(AudioStatus::Completed));
        assert_eq!(job.text.as_deref(), Some("Once upon a time"));
        let audio = job.audio_path.unwrap();
        assert!(audio.ends_with("ESP32_202501011200_05.mp3"));
        assert!(audio.exists());
    }

    #[tokio::test]
    async fn test_no_text_skips_audio() {
        let fixture = Fixture::new(false);
        let photo = fixture.photo();

        fixture.pipeline(None).process("ESP32_202501011200_05.jpg", &photo).await;

        let job = fixture.jobs.get("ESP32_202501011200_05.jpg").await.unwrap();
        assert_eq!(job.status, JobStatus::OcrOnly);
        assert_eq!(job.audio_status, Some(AudioStatus::Skipped));
        assert_eq!(fixture.synthesizer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_audio_failure_keeps_text() {
        let fixture = Fixture::new(true);
        let photo = fixture.photo();

        fixture.pipeline(Some("words")).process("ESP32_202501011200_05.jpg", &photo).await;

        let job = fixture.jobs.get("ESP32_202501011200_05.jpg").await.unwrap();
        assert_eq!(job.status, JobStatus::OcrOnly);
        assert_eq!(job.audio_status, Some(AudioStatus::Failed));
        assert_eq!(job.audio_error.as_deref(), Some("Audio generation failed"));
        assert_eq!(job.text.as_deref(), Some("words"));
    }

    #[tokio::test]
    async fn test_unreadable_upload_is_an_error() {
        let fixture = Fixture::new(false);
        let path = fixture.dir.path().join("ESP32_202501011200_06.jpg");
        std::fs::write(&path, b"garbage").unwrap();

        fixture.pipeline(Some("never read")).process("ESP32_202501011200_06.jpg", &path).await;

        let job = fixture.jobs.get("ESP32_202501011200_06.jpg").await.unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.error.is_some());
    }

    #[tokio::test]
    async fn test_pool_runs_submitted_jobs() {
        let fixture = Fixture::new(false);
        let photo = fixture.photo();
        let pool = WorkerPool::new(Arc::new(fixture.pipeline(Some("hello"))), DEFAULT_WORKERS);

        let handles: Vec<_> = (0..5)
            .map(|i| pool.submit(format!("job_{}.jpg", i), photo.clone()))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(pool.available(), DEFAULT_WORKERS);
        assert_eq!(fixture.jobs.list().await.len(), 5);
        assert_eq!(fixture.synthesizer.call_count(), 5);
    }
}
