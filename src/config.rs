//! Configuration management for Lector Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
    pub review: ReviewConfig,
    pub tts: TtsConfig,
    pub annotation: AnnotationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Concurrent narration jobs
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub annotated_dir: PathBuf,
    pub audio_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub tesseract_bin: PathBuf,
    pub tesseract_lang: String,
    /// PaddleOCR hub-serving base URL
    pub paddle_url: String,
    pub paddle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    pub ollama_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    pub url: String,
    pub language: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationConfig {
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub save_rotated_frames: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                workers: 3,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("uploaded_images"),
                annotated_dir: PathBuf::from("annotated_images"),
                audio_dir: PathBuf::from("output_audio"),
            },
            ocr: OcrConfig {
                tesseract_bin: PathBuf::from("tesseract"),
                tesseract_lang: "eng".to_string(),
                paddle_url: "http://localhost:8866".to_string(),
                paddle_timeout_secs: 60,
            },
            review: ReviewConfig {
                ollama_url: "http://localhost:11434".to_string(),
                model: "mistral-small:24b-instruct-2501-q8_0".to_string(),
                timeout_secs: 120,
            },
            tts: TtsConfig {
                url: "https://translate.google.com/translate_tts".to_string(),
                language: "en".to_string(),
                timeout_secs: 30,
            },
            annotation: AnnotationConfig {
                font_path: None,
                font_size: 20.0,
                save_rotated_frames: false,
            },
        }
    }
}

impl Config {
    /// Read configuration from the environment, defaulting anything unset
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parsed("SERVER_PORT", defaults.server.port),
                workers: parsed("WORKER_COUNT", defaults.server.workers),
            },
            storage: StorageConfig {
                upload_dir: path_var("UPLOAD_DIR").unwrap_or(defaults.storage.upload_dir),
                annotated_dir: path_var("ANNOTATED_DIR").unwrap_or(defaults.storage.annotated_dir),
                audio_dir: path_var("AUDIO_DIR").unwrap_or(defaults.storage.audio_dir),
            },
            ocr: OcrConfig {
                tesseract_bin: path_var("TESSERACT_BIN").unwrap_or(defaults.ocr.tesseract_bin),
                tesseract_lang: env::var("TESSERACT_LANG").unwrap_or(defaults.ocr.tesseract_lang),
                paddle_url: env::var("PADDLE_URL").unwrap_or(defaults.ocr.paddle_url),
                paddle_timeout_secs: parsed("PADDLE_TIMEOUT_SECS", defaults.ocr.paddle_timeout_secs),
            },
            review: ReviewConfig {
                ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.review.ollama_url),
                model: env::var("OLLAMA_MODEL").unwrap_or(defaults.review.model),
                timeout_secs: parsed("REVIEW_TIMEOUT_SECS", defaults.review.timeout_secs),
            },
            tts: TtsConfig {
                url: env::var("TTS_URL").unwrap_or(defaults.tts.url),
                language: env::var("TTS_LANGUAGE").unwrap_or(defaults.tts.language),
                timeout_secs: parsed("TTS_TIMEOUT_SECS", defaults.tts.timeout_secs),
            },
            annotation: AnnotationConfig {
                font_path: path_var("FONT_PATH"),
                font_size: parsed("FONT_SIZE", defaults.annotation.font_size),
                save_rotated_frames: parsed("SAVE_ROTATED_FRAMES", defaults.annotation.save_rotated_frames),
            },
        }
    }
}

fn parsed<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %value, "Ignoring unparseable setting");
            default
        }),
        Err(_) => default,
    }
}

fn path_var(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}
