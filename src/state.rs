//! Application state management

use std::sync::Arc;
use std::time::Duration;

use crate::annotate::{Annotator, AnnotatorConfig};
use crate::config::Config;
use crate::narration::{
    GoogleTts, InMemoryJobStore, JobStore, NarrationPipeline, SpeechSynthesizer, TextExtractor, TextReader,
    WorkerPool,
};
use crate::ocr::{OcrEngine, PaddleEngine, TesseractEngine};
use crate::pipeline::PipelineCoordinator;
use crate::review::{OllamaReviewer, SpellReviewer};
use crate::storage::Storage;

/// External services the server talks to
#[derive(Clone)]
pub struct Collaborators {
    pub paddle: Arc<dyn OcrEngine>,
    pub tesseract: Arc<dyn OcrEngine>,
    pub reviewer: Arc<dyn SpellReviewer>,
    /// Plain-text reader for the narration flow
    pub reader: Arc<dyn TextReader>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub jobs: Arc<dyn JobStore>,
}

impl Collaborators {
    /// Real adapters built from configuration
    pub fn from_config(config: &Config) -> Self {
        let tesseract = Arc::new(TesseractEngine::new(
            config.ocr.tesseract_bin.clone(),
            &config.ocr.tesseract_lang,
        ));

        Self {
            paddle: Arc::new(PaddleEngine::new(
                &config.ocr.paddle_url,
                Duration::from_secs(config.ocr.paddle_timeout_secs),
            )),
            tesseract: tesseract.clone(),
            reviewer: Arc::new(OllamaReviewer::new(
                &config.review.ollama_url,
                &config.review.model,
                Duration::from_secs(config.review.timeout_secs),
            )),
            reader: tesseract,
            synthesizer: Arc::new(GoogleTts::new(
                &config.tts.url,
                Duration::from_secs(config.tts.timeout_secs),
            )),
            jobs: Arc::new(InMemoryJobStore::new()),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    storage: Storage,
    jobs: Arc<dyn JobStore>,
    workers: WorkerPool,
    pipeline: PipelineCoordinator,
}

impl AppState {
    /// Create application state with the real collaborators
    pub fn new(config: Config) -> Self {
        let collaborators = Collaborators::from_config(&config);
        Self::with_collaborators(config, collaborators)
    }

    /// Create application state around the given collaborators
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Self {
        let storage = Storage::new(
            config.storage.upload_dir.clone(),
            config.storage.annotated_dir.clone(),
            config.storage.audio_dir.clone(),
        );

        let annotator = Annotator::new(AnnotatorConfig {
            font_path: config.annotation.font_path.clone(),
            font_size: config.annotation.font_size,
            save_rotated_frames: config.annotation.save_rotated_frames,
            ..AnnotatorConfig::new(config.storage.annotated_dir.clone())
        });

        let pipeline = PipelineCoordinator::new(
            collaborators.paddle,
            collaborators.tesseract,
            collaborators.reviewer,
            Arc::new(annotator),
        );

        let narration = NarrationPipeline::new(
            TextExtractor::new(collaborators.reader),
            collaborators.synthesizer,
            collaborators.jobs.clone(),
            config.storage.audio_dir.clone(),
            &config.tts.language,
        );
        let workers = WorkerPool::new(Arc::new(narration), config.server.workers);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                jobs: collaborators.jobs,
                workers,
                pipeline,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the output storage
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    /// Get the narration job store
    pub fn jobs(&self) -> &dyn JobStore {
        self.inner.jobs.as_ref()
    }

    /// Get the narration worker pool
    pub fn workers(&self) -> &WorkerPool {
        &self.inner.workers
    }

    /// Get the spell-check / highlight pipeline
    pub fn pipeline(&self) -> &PipelineCoordinator {
        &self.inner.pipeline
    }
}
