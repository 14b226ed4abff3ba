use crate::config::AppConfig;
use crate::constants::{FALLBACK_MIME_TYPE, MAX_UNIQUE_NAME_ATTEMPTS, MIME_TYPES};
use crate::conversion::ConversionResult;
use crate::security::sanitize_filename;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Save cancelled by user")]
    Cancelled,
    #[error("Download directory does not exist: {path}")]
    MissingDirectory { path: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn new(base_name: &str, result: ConversionResult) -> Self {
        let file_name = sanitize_filename(&format!("{}.{}", base_name, result.target_extension));
        let mime_type = mime_type_for(&result.target_extension, &result.bytes);

        Self {
            file_name,
            mime_type,
            bytes: result.bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadReceipt {
    pub file_name: String,
    pub mime_type: String,
    pub saved_to: PathBuf,
    pub size_bytes: u64,
}

/// Extension table first, then content sniffing, then a generic binary type.
pub fn mime_type_for(extension: &str, bytes: &[u8]) -> String {
    let ext = extension.to_ascii_lowercase();
    if let Some((_, mime)) = MIME_TYPES.iter().find(|(e, _)| *e == ext) {
        return mime.to_string();
    }

    match infer::get(bytes) {
        Some(kind) => kind.mime_type().to_string(),
        None => FALLBACK_MIME_TYPE.to_string(),
    }
}

pub fn ensure_unique_path(path: PathBuf) -> PathBuf {
    if !path.exists() {
        return path;
    }

    let parent = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string();

    for counter in 1..=MAX_UNIQUE_NAME_ATTEMPTS {
        let new_name = if extension.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, extension)
        };

        let candidate = parent.join(new_name);
        if !candidate.exists() {
            return candidate;
        }
    }

    parent.join(format!(
        "{}_{}.{}",
        stem,
        uuid::Uuid::new_v4().simple(),
        extension
    ))
}

#[async_trait]
pub trait DownloadEmitter: Send + Sync {
    async fn emit(&self, download: Download) -> Result<DownloadReceipt, DownloadError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveTarget {
    Prompt { default_dir: PathBuf },
    Directory(PathBuf),
}

/// Bytes are staged in a temp file next to the destination and renamed into
/// place. The saved file's handle is held for `release_delay` afterwards.
#[derive(Debug, Clone)]
pub struct FsDownloadEmitter {
    target: SaveTarget,
    release_delay: Duration,
    open_after_save: bool,
}

impl FsDownloadEmitter {
    pub fn new(target: SaveTarget, release_delay: Duration) -> Self {
        Self {
            target,
            release_delay,
            open_after_save: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let dir = config.resolve_download_dir();
        let target = if config.prompt_for_save_location {
            SaveTarget::Prompt { default_dir: dir }
        } else {
            SaveTarget::Directory(dir)
        };

        let mut emitter = Self::new(target, Duration::from_millis(config.release_delay_ms));
        emitter.open_after_save = config.open_after_save;
        emitter
    }

    async fn destination(&self, file_name: &str) -> Result<PathBuf, DownloadError> {
        match &self.target {
            SaveTarget::Prompt { default_dir } => rfd::AsyncFileDialog::new()
                .set_directory(default_dir)
                .set_file_name(file_name)
                .save_file()
                .await
                .map(|handle| handle.path().to_path_buf())
                .ok_or(DownloadError::Cancelled),
            SaveTarget::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(DownloadError::MissingDirectory {
                        path: dir.display().to_string(),
                    });
                }
                Ok(ensure_unique_path(dir.join(file_name)))
            }
        }
    }

    fn release_later<T: Send + 'static>(&self, handle: T) {
        let delay = self.release_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            drop(handle);
        });
    }
}

#[async_trait]
impl DownloadEmitter for FsDownloadEmitter {
    async fn emit(&self, download: Download) -> Result<DownloadReceipt, DownloadError> {
        let destination = self.destination(&download.file_name).await?;
        // The dialog already asked before replacing an existing file
        let overwrite = matches!(self.target, SaveTarget::Prompt { .. });

        let staging_dir = destination.parent().unwrap_or(Path::new(".")).to_path_buf();
        let target = destination.clone();
        let bytes = download.bytes;
        let size_bytes = bytes.len() as u64;
        let saved = tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
            let mut staged = tempfile::Builder::new()
                .prefix(".mediaconvert-")
                .suffix(".part")
                .tempfile_in(&staging_dir)?;
            staged.write_all(&bytes)?;
            staged.flush()?;
            let file = if overwrite {
                staged.persist(&target)?
            } else {
                staged.persist_noclobber(&target)?
            };
            Ok(file)
        })
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;
        self.release_later(saved);

        tracing::info!(
            "Saved {} ({}, {} bytes) to {:?}",
            download.file_name,
            download.mime_type,
            size_bytes,
            destination
        );

        if self.open_after_save {
            if let Err(e) = webbrowser::open(&destination.to_string_lossy()) {
                tracing::warn!("Could not open {:?}: {}", destination, e);
            }
        }

        Ok(DownloadReceipt {
            file_name: download.file_name,
            mime_type: download.mime_type,
            saved_to: destination,
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(ext: &str, bytes: &[u8]) -> ConversionResult {
        ConversionResult {
            bytes: bytes.to_vec(),
            target_extension: ext.to_string(),
        }
    }

    #[test]
    fn test_download_name_and_mime() {
        let download = Download::new("sample", result("mp4", b"data"));
        assert_eq!(download.file_name, "sample.mp4");
        assert_eq!(download.mime_type, "video/mp4");
    }

    #[test]
    fn test_images_are_not_tagged_as_video() {
        assert_eq!(mime_type_for("png", b""), "image/png");
        assert_eq!(mime_type_for("JPG", b""), "image/jpeg");
        assert_eq!(mime_type_for("mp3", b""), "audio/mpeg");
    }

    #[test]
    fn test_unknown_extension_sniffs_content() {
        let png_header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(mime_type_for("xyz", &png_header), "image/png");
        assert_eq!(mime_type_for("xyz", b"plain"), "application/octet-stream");
    }

    #[test]
    fn test_unique_path() {
        let dir = tempfile::tempdir().unwrap();
        let wanted = dir.path().join("sample.mp4");
        assert_eq!(ensure_unique_path(wanted.clone()), wanted);

        std::fs::write(&wanted, b"x").unwrap();
        assert_eq!(
            ensure_unique_path(wanted.clone()),
            dir.path().join("sample_1.mp4")
        );

        std::fs::write(dir.path().join("sample_1.mp4"), b"x").unwrap();
        assert_eq!(ensure_unique_path(wanted), dir.path().join("sample_2.mp4"));
    }

    #[tokio::test]
    async fn test_emit_writes_file_once_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = FsDownloadEmitter::new(
            SaveTarget::Directory(dir.path().to_path_buf()),
            Duration::from_millis(10),
        );

        let receipt = emitter
            .emit(Download::new("sample", result("mp4", b"converted")))
            .await
            .unwrap();

        assert_eq!(receipt.saved_to, dir.path().join("sample.mp4"));
        assert_eq!(receipt.size_bytes, 9);
        assert_eq!(std::fs::read(&receipt.saved_to).unwrap(), b"converted");

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sample.mp4".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_is_released_only_after_delay() {
        let emitter = FsDownloadEmitter::new(
            SaveTarget::Directory(PathBuf::from(".")),
            Duration::from_millis(100),
        );
        let handle = std::sync::Arc::new(());

        emitter.release_later(handle.clone());
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        assert_eq!(std::sync::Arc::strong_count(&handle), 2);

        tokio::time::advance(Duration::from_millis(99)).await;
        tokio::task::yield_now().await;
        assert_eq!(std::sync::Arc::strong_count(&handle), 2);

        tokio::time::advance(Duration::from_millis(1)).await;
        for _ in 0..10 {
            if std::sync::Arc::strong_count(&handle) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(std::sync::Arc::strong_count(&handle), 1);
    }

    #[test]
    fn test_hidden_base_name_survives() {
        let download = Download::new(".hidden", result("mp4", b"data"));
        assert_eq!(download.file_name, ".hidden.mp4");
    }

    #[tokio::test]
    async fn test_emit_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.mp4"), b"older").unwrap();

        let emitter = FsDownloadEmitter::new(
            SaveTarget::Directory(dir.path().to_path_buf()),
            Duration::from_millis(1),
        );
        let receipt = emitter
            .emit(Download::new("sample", result("mp4", b"newer")))
            .await
            .unwrap();

        assert_eq!(receipt.saved_to, dir.path().join("sample_1.mp4"));
        assert_eq!(std::fs::read(dir.path().join("sample.mp4")).unwrap(), b"older");
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = FsDownloadEmitter::new(
            SaveTarget::Directory(dir.path().join("gone")),
            Duration::from_millis(1),
        );
        assert!(matches!(
            emitter.emit(Download::new("a", result("mp4", b"x"))).await,
            Err(DownloadError::MissingDirectory { .. })
        ));
    }
}
