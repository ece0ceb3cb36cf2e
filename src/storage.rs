//! Output storage
//!
//! Three fixed areas on local disk: uploaded images, annotated images and
//! generated audio. Filenames served over HTTP are resolved strictly inside
//! their area.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use chrono::NaiveDateTime;
use tokio::io::AsyncWriteExt;

/// Storage area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Uploads,
    Annotated,
    Audio,
}

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid filename: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::NotFound(_) => StatusCode::NOT_FOUND,
            StorageError::InvalidName(_) => StatusCode::BAD_REQUEST,
            StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Local output areas
#[derive(Debug, Clone)]
pub struct Storage {
    uploads: PathBuf,
    annotated: PathBuf,
    audio: PathBuf,
}

impl Storage {
    pub fn new(uploads: impl Into<PathBuf>, annotated: impl Into<PathBuf>, audio: impl Into<PathBuf>) -> Self {
        Self {
            uploads: uploads.into(),
            annotated: annotated.into(),
            audio: audio.into(),
        }
    }

    pub fn dir(&self, area: Area) -> &Path {
        match area {
            Area::Uploads => &self.uploads,
            Area::Annotated => &self.annotated,
            Area::Audio => &self.audio,
        }
    }

    /// Create all areas that do not exist yet
    pub async fn ensure_dirs(&self) -> Result<(), StorageError> {
        for dir in [&self.uploads, &self.annotated, &self.audio] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Store a camera upload under a timestamp-derived name.
    ///
    /// Two uploads in the same second get `_1`, `_2`, ... suffixes.
    pub async fn save_upload(&self, data: &[u8], now: NaiveDateTime) -> Result<(String, PathBuf), StorageError> {
        let base = upload_base_name(now);

        for attempt in 0u32.. {
            let filename = if attempt == 0 {
                format!("{}.jpg", base)
            } else {
                format!("{}_{}.jpg", base, attempt)
            };
            let path = self.uploads.join(&filename);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(data).await?;
                    file.flush().await?;
                    tracing::info!(filename = %filename, size = data.len(), "Image saved");
                    return Ok((filename, path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(StorageError::InvalidName(base))
    }

    /// Store client-named data in an area, sanitizing the name
    pub async fn save_named(&self, area: Area, name: &str, data: &[u8]) -> Result<(String, PathBuf), StorageError> {
        let filename = sanitize_filename(name).ok_or_else(|| StorageError::InvalidName(name.to_string()))?;
        let path = self.dir(area).join(&filename);
        tokio::fs::write(&path, data).await?;
        Ok((filename, path))
    }

    /// Path of `filename` in `area`, without checking existence
    pub fn path_of(&self, area: Area, filename: &str) -> Result<PathBuf, StorageError> {
        if !is_safe_name(filename) {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        Ok(self.dir(area).join(filename))
    }

    /// Path of an existing file in `area`
    pub async fn resolve(&self, area: Area, filename: &str) -> Result<PathBuf, StorageError> {
        let path = self.path_of(area, filename)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StorageError::NotFound(filename.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(filename.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, area: Area, filename: &str) -> bool {
        self.resolve(area, filename).await.is_ok()
    }

    /// Most recently modified MP3 in the audio area
    pub async fn latest_audio(&self) -> Result<Option<PathBuf>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.audio).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_mp3 = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("mp3"))
                .unwrap_or(false);
            if !is_mp3 {
                continue;
            }
            let modified = entry.metadata().await?.modified()?;
            if latest.as_ref().map_or(true, |(newest, _)| modified > *newest) {
                latest = Some((modified, path));
            }
        }

        Ok(latest.map(|(_, path)| path))
    }
}

/// `ESP32_YYYYMMDDHHMM_SS`
pub fn upload_base_name(now: NaiveDateTime) -> String {
    now.format("ESP32_%Y%m%d%H%M_%S").to_string()
}

/// A plain filename: no separators, no parent references, no hidden files
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && name != ".."
}

/// Reduce a client-supplied name to a safe plain filename.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_` from the last path
/// component; whitespace becomes `_`.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// MIME type for a served file
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path).first_or_octet_stream().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn storage(dir: &Path) -> Storage {
        Storage::new(dir.join("uploaded_images"), dir.join("annotated_images"), dir.join("output_audio"))
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(12, 4, 9)
            .unwrap()
    }

    #[test]
    fn test_upload_base_name() {
        assert_eq!(upload_base_name(noon()), "ESP32_202503071204_09");
    }

    #[tokio::test]
    async fn test_same_second_uploads_get_suffixes() {
        let dir = TempDir::new().unwrap();
        let storage = storage(dir.path());
        storage.ensure_dirs().await.unwrap();

        let (first, _) = storage.save_upload(b"one", noon()).await.unwrap();
        let (second, path) = storage.save_upload(b"two", noon()).await.unwrap();
        let (third, _) = storage.save_upload(b"three", noon()).await.unwrap();

        assert_eq!(first, "ESP32_202503071204_09.jpg");
        assert_eq!(second, "ESP32_202503071204_09_1.jpg");
        assert_eq!(third, "ESP32_202503071204_09_2.jpg");
        assert_eq!(std::fs::read(path).unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = storage(dir.path());
        storage.ensure_dirs().await.unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();

        for name in ["../secret.txt", "..", ".hidden", "a/b.png", "a\\b.png", ""] {
            assert!(matches!(
                storage.resolve(Area::Annotated, name).await,
                Err(StorageError::InvalidName(_))
            ));
        }
        assert!(matches!(
            storage.resolve(Area::Annotated, "missing.png").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my page.PNG").as_deref(), Some("my_page.PNG"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\photos\\scan (1).jpg").as_deref(), Some("scan_1.jpg"));
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("\u{6587}\u{4ef6}"), None);
    }

    #[tokio::test]
    async fn test_latest_audio_picks_newest_mp3() {
        let dir = TempDir::new().unwrap();
        let storage = storage(dir.path());
        assert_eq!(storage.latest_audio().await.unwrap(), None);
        storage.ensure_dirs().await.unwrap();

        let audio = dir.path().join("output_audio");
        let old = audio.join("old.mp3");
        let new = audio.join("new.mp3");
        std::fs::write(&old, b"a").unwrap();
        std::fs::write(&new, b"b").unwrap();
        std::fs::write(audio.join("notes.txt"), b"c").unwrap();

        let base = std::time::SystemTime::now();
        std::fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(base - std::time::Duration::from_secs(60))
            .unwrap();
        std::fs::File::options()
            .write(true)
            .open(&new)
            .unwrap()
            .set_modified(base)
            .unwrap();

        assert_eq!(storage.latest_audio().await.unwrap(), Some(new));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.mp3")), "audio/mpeg");
        assert_eq!(content_type(Path::new("a.png")), "image/png");
        assert_eq!(content_type(Path::new("a.unknownext")), "application/octet-stream");
    }
}
