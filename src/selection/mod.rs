use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Selected path has no file name: {path}")]
    NoFileName { path: String },
    #[error("Not a file: {path}")]
    NotAFile { path: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file the user picked. Only metadata lives here; the bytes are read when a
/// conversion starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub inferred_extension: String,
    pub base_name: String,
    pub size_bytes: u64,
}

impl SelectedFile {
    pub fn from_path(path: &Path) -> Result<Self, SelectionError> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(SelectionError::NotAFile {
                path: path.display().to_string(),
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| SelectionError::NoFileName {
                path: path.display().to_string(),
            })?;

        Ok(Self::with_name(path.to_path_buf(), name, metadata.len()))
    }

    pub fn with_name(path: PathBuf, name: String, size_bytes: u64) -> Self {
        Self {
            inferred_extension: inferred_extension(&name).to_string(),
            base_name: base_name(&name).to_string(),
            path,
            name,
            size_bytes,
        }
    }

    pub fn size_human_readable(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

        let mut size = self.size_bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.1} {}", size, UNITS[unit_index])
        }
    }
}

/// Text after the last period. A name without any period is returned whole.
pub fn inferred_extension(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Text before the last period. A single leading period (dotfiles) belongs
/// to the base name.
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    file: Option<SelectedFile>,
    pub target_extension: String,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_file_selected(&mut self, file: SelectedFile) -> Option<SelectedFile> {
        tracing::info!(
            "Selected {} ({} bytes, extension {:?})",
            file.name,
            file.size_bytes,
            file.inferred_extension
        );
        self.file.replace(file)
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn clear_target_extension(&mut self) {
        self.target_extension.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_name() {
        let file = SelectedFile::with_name(PathBuf::from("/v/clip.mov"), "clip.mov".into(), 0);
        assert_eq!(file.base_name, "clip");
        assert_eq!(file.inferred_extension, "mov");
    }

    #[test]
    fn test_multi_dot_name_keeps_inner_segments() {
        let file =
            SelectedFile::with_name(PathBuf::from("my.video.mov"), "my.video.mov".into(), 0);
        assert_eq!(file.base_name, "my.video");
        assert_eq!(file.inferred_extension, "mov");
    }

    #[test]
    fn test_name_without_extension() {
        assert_eq!(inferred_extension("README"), "README");
        assert_eq!(base_name("README"), "README");
    }

    #[test]
    fn test_dotfile_and_trailing_dot() {
        assert_eq!(base_name(".hidden"), ".hidden");
        assert_eq!(inferred_extension(".hidden"), "hidden");
        assert_eq!(base_name("clip."), "clip");
        assert_eq!(inferred_extension("clip."), "");
    }

    #[test]
    fn test_from_path_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.webm");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0u8; 2048]).unwrap();

        let file = SelectedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "sample.webm");
        assert_eq!(file.size_bytes, 2048);
        assert_eq!(file.size_human_readable(), "2.0 KB");
    }

    #[test]
    fn test_from_path_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SelectedFile::from_path(dir.path()),
            Err(SelectionError::NotAFile { .. })
        ));
    }

    #[test]
    fn test_new_pick_replaces_old() {
        let mut state = SelectionState::new();
        assert!(state
            .on_file_selected(SelectedFile::with_name("a.mov".into(), "a.mov".into(), 1))
            .is_none());

        let previous =
            state.on_file_selected(SelectedFile::with_name("b.png".into(), "b.png".into(), 1));
        assert_eq!(previous.map(|f| f.name), Some("a.mov".to_string()));
        assert_eq!(state.file().map(|f| f.name.as_str()), Some("b.png"));
    }
}
