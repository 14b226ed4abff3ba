use super::{EngineError, TranscodeEngine};
use crate::config::AppConfig;
use crate::constants::{DEFAULT_ENGINE_LOG_LEVEL, STDERR_TAIL_LINES};
use crate::security::SecurityValidator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Drives a local `ffmpeg` binary. The virtual filesystem is a private temp
/// directory that lives exactly as long as the engine is loaded.
pub struct FfmpegProcessEngine {
    ffmpeg_path: PathBuf,
    log_output: bool,
    log_level: String,
    workspace: Option<TempDir>,
    validator: SecurityValidator,
}

impl FfmpegProcessEngine {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            log_output: true,
            log_level: DEFAULT_ENGINE_LOG_LEVEL.to_string(),
            workspace: None,
            validator: SecurityValidator::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut engine = Self::new(config.ffmpeg_path.clone());
        engine.log_output = config.engine_log_output;
        engine.log_level = config.engine_log_level.clone();
        engine
    }

    pub fn workspace_dir(&self) -> Option<&Path> {
        self.workspace.as_ref().map(|w| w.path())
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, EngineError> {
        let dir = self.workspace_dir().ok_or(EngineError::NotLoaded)?;
        self.validator.validate_virtual_name(name)?;
        Ok(dir.join(name))
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegProcessEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn load(&mut self) -> Result<(), EngineError> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                EngineError::load_failed(format!(
                    "cannot start {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(EngineError::load_failed(format!(
                "{} -version exited with {}",
                self.ffmpeg_path.display(),
                output.status
            )));
        }

        if let Some(line) = String::from_utf8_lossy(&output.stdout).lines().next() {
            tracing::info!("Engine binary: {}", line);
        }

        let workspace = tempfile::Builder::new()
            .prefix("mediaconvert-")
            .tempdir()?;
        tracing::debug!("Engine workspace at {:?}", workspace.path());
        self.workspace = Some(workspace);

        Ok(())
    }

    async fn write_input(&mut self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn run(&mut self, args: &[String]) -> Result<(), EngineError> {
        let dir = self.workspace_dir().ok_or(EngineError::NotLoaded)?;
        self.validator.validate_engine_args(args)?;

        tracing::info!("Running {} {}", self.ffmpeg_path.display(), args.join(" "));

        let mut child = Command::new(&self.ffmpeg_path)
            .current_dir(dir)
            .args(["-nostdin", "-y", "-hide_banner", "-loglevel"])
            .arg(&self.log_level)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            while let Some(line) = lines.next_line().await? {
                if self.log_output {
                    tracing::debug!(target: "ffmpeg", "{}", line);
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::RunFailed {
                code: status.code(),
                stderr: Vec::from(tail).join("\n"),
            })
        }
    }

    async fn read_output(&mut self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EngineError::OutputMissing {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&mut self, name: &str) -> Result<(), EngineError> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn unload(&mut self) -> Result<(), EngineError> {
        if let Some(workspace) = self.workspace.take() {
            workspace.close()?;
            tracing::info!("Engine workspace released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_fails_to_load() {
        let mut engine = FfmpegProcessEngine::new("/nonexistent/bin/ffmpeg-does-not-exist");
        let err = engine.load().await.unwrap_err();
        assert!(matches!(err, EngineError::LoadFailed { .. }));
        assert!(engine.workspace_dir().is_none());
    }

    #[tokio::test]
    async fn test_calls_before_load_are_rejected() {
        let mut engine = FfmpegProcessEngine::new("ffmpeg");
        assert!(matches!(
            engine.write_input("test.mov", b"data").await,
            Err(EngineError::NotLoaded)
        ));
        assert!(matches!(
            engine.read_output("output.mp4").await,
            Err(EngineError::NotLoaded)
        ));
        assert!(matches!(engine.run(&[]).await, Err(EngineError::NotLoaded)));
    }

    #[cfg(unix)]
    fn fake_ffmpeg(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = r#"#!/bin/sh
if [ "$1" = "-version" ]; then echo "ffmpeg version fake"; exit 0; fi
in=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -i) in="$2"; shift 2;;
    -loglevel) shift 2;;
    *) out="$1"; shift;;
  esac
done
case "$out" in
  *.nope) echo "Unable to find a suitable output format for '$out'" >&2; exit 1;;
esac
cp "$in" "$out"
"#;
        let path = dir.join("ffmpeg");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_full_lifecycle_with_fake_binary() {
        let bin_dir = tempfile::tempdir().unwrap();
        let mut engine = FfmpegProcessEngine::new(fake_ffmpeg(bin_dir.path()));

        engine.load().await.unwrap();
        let workspace = engine.workspace_dir().unwrap().to_path_buf();
        assert!(workspace.exists());

        engine.write_input("test.webm", b"webm bytes").await.unwrap();
        let args: Vec<String> = ["-i", "test.webm", "output.mp4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        engine.run(&args).await.unwrap();
        assert_eq!(engine.read_output("output.mp4").await.unwrap(), b"webm bytes");

        // Unsupported target: non-zero exit carries the stderr tail
        let bad: Vec<String> = ["-i", "test.webm", "output.nope"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        match engine.run(&bad).await {
            Err(EngineError::RunFailed { code, stderr }) => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("suitable output format"));
            }
            other => panic!("expected RunFailed, got {:?}", other),
        }
        assert!(matches!(
            engine.read_output("output.nope").await,
            Err(EngineError::OutputMissing { .. })
        ));

        engine.remove("output.mp4").await.unwrap();
        engine.remove("output.mp4").await.unwrap();
        assert!(!workspace.join("output.mp4").exists());

        engine.unload().await.unwrap();
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_traversal_names_are_rejected() {
        let mut engine = FfmpegProcessEngine::new("ffmpeg");
        engine.workspace = Some(tempfile::tempdir().unwrap());

        assert!(matches!(
            engine.write_input("../escape.mp4", b"x").await,
            Err(EngineError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_shell_characters_are_plain_names() {
        let mut engine = FfmpegProcessEngine::new("ffmpeg");
        engine.workspace = Some(tempfile::tempdir().unwrap());

        engine.write_input("test.Tom & Jerry", b"x").await.unwrap();
        let dir = engine.workspace_dir().unwrap().to_path_buf();
        assert_eq!(std::fs::read(dir.join("test.Tom & Jerry")).unwrap(), b"x");
        engine.remove("test.Tom & Jerry").await.unwrap();
    }
}
