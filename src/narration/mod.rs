//! Narration Module
//!
//! The camera flow: an uploaded photo is read as text and the text is
//! spoken into an MP3, with progress tracked per upload.

mod extract;
mod jobs;
mod tts;
mod worker;

pub use extract::{clean_text, preprocess, ExtractError, TextExtractor, TextReader, NARRATION_PSM_MODES};
pub use jobs::{AudioStatus, InMemoryJobStore, JobStatus, JobStore, ProcessingJob};
pub use tts::{chunk_text, GoogleTts, SpeechSynthesizer, TtsError, MAX_CHUNK_CHARS};
pub use worker::{NarrationPipeline, WorkerPool, DEFAULT_WORKERS};
