//! Text-to-speech
//!
//! The public Google Translate TTS endpoint only accepts short inputs, so
//! text is split into chunks of at most 100 characters on word boundaries.
//! Each chunk is fetched as MP3 and the frames are concatenated into a
//! single file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

/// Longest chunk the endpoint accepts
pub const MAX_CHUNK_CHARS: usize = 100;

/// TTS error types
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("No text to synthesize")]
    EmptyText,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("TTS service returned {0}")]
    Status(u16),

    #[error("TTS service returned no audio")]
    EmptyAudio,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Speech synthesizer trait
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into an MP3 at `output`, returning the written path
    async fn synthesize(&self, text: &str, language: &str, output: &Path) -> Result<PathBuf, TtsError>;
}

/// Google Translate TTS client
pub struct GoogleTts {
    base_url: String,
    client: reqwest::Client,
}

impl GoogleTts {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.to_string(),
            client,
        }
    }

    fn chunk_url(&self, chunk: &str, language: &str, index: usize, total: usize) -> String {
        format!(
            "{}?ie=UTF-8&client=tw-ob&tl={}&q={}&total={}&idx={}&textlen={}",
            self.base_url,
            urlencoding::encode(language),
            urlencoding::encode(chunk),
            total,
            index,
            chunk.chars().count()
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language: &str, output: &Path) -> Result<PathBuf, TtsError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let url = self.chunk_url(chunk, language, index, chunks.len());
            let response = self
                .client
                .get(&url)
                .header(reqwest::header::USER_AGENT, "Mozilla/5.0")
                .send()
                .await
                .map_err(|e| TtsError::Transport(e.to_string()))?;

            if !response.status().is_success() {
                return Err(TtsError::Status(response.status().as_u16()));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| TtsError::Transport(e.to_string()))?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, &audio).await?;

        tracing::info!(
            path = %output.display(),
            chunks = chunks.len(),
            bytes = audio.len(),
            "Audio generated"
        );

        Ok(output.to_path_buf())
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Breaks on whitespace; a single word longer than the limit is split
/// mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Mock synthesizer for testing
#[cfg(test)]
pub struct MockSynthesizer {
    pub fail: bool,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockSynthesizer {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _language: &str, output: &Path) -> Result<PathBuf, TtsError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail {
            return Err(TtsError::Status(503));
        }
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, format!("ID3 {}", text)).await?;
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_respect_limit_and_word_boundaries() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(8);
        let chunks = chunk_text(&text, MAX_CHUNK_CHARS);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CHUNK_CHARS));
        assert!(chunks.iter().all(|c| !c.starts_with(' ') && !c.ends_with(' ')));
        assert_eq!(chunks.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn test_long_word_is_split() {
        let word = "a".repeat(250);
        let chunks = chunk_text(&format!("hi {} there", word), 100);
        assert_eq!(chunks, vec!["hi".to_string(), "a".repeat(100), "a".repeat(100), "a".repeat(50), "there".to_string()]);
    }

    #[test]
    fn test_exact_fit() {
        assert_eq!(chunk_text("ab cd", 5), vec!["ab cd"]);
        assert_eq!(chunk_text("ab cde", 5), vec!["ab", "cde"]);
        assert!(chunk_text("   ", 5).is_empty());
    }

    #[test]
    fn test_chunk_url_is_encoded() {
        let tts = GoogleTts::new("http://localhost:9/translate_tts", Duration::from_secs(1));
        let url = tts.chunk_url("hello world & more", "en", 0, 2);
        assert_eq!(
            url,
            "http://localhost:9/translate_tts?ie=UTF-8&client=tw-ob&tl=en&q=hello%20world%20%26%20more&total=2&idx=0&textlen=18"
        );
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let tts = GoogleTts::new("http://127.0.0.1:9/translate_tts", Duration::from_secs(1));
        let dir = tempfile::TempDir::new().unwrap();
        let result = tts.synthesize(" \n", "en", &dir.path().join("x.mp3")).await;
        assert!(matches!(result, Err(TtsError::EmptyText)));
    }
}
