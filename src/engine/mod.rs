use async_trait::async_trait;
use thiserror::Error;

pub mod ffmpeg;

pub use ffmpeg::FfmpegProcessEngine;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Engine not loaded")]
    NotLoaded,
    #[error("Engine failed to load: {reason}")]
    LoadFailed { reason: String },
    #[error("Engine rejected file name: {0}")]
    Rejected(#[from] crate::security::SecurityError),
    #[error("Engine command failed (exit code {code:?}): {stderr}")]
    RunFailed { code: Option<i32>, stderr: String },
    #[error("Engine produced no file named {name}")]
    OutputMissing { name: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn load_failed(reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            reason: reason.into(),
        }
    }
}

/// A media engine addressed through a virtual filesystem and a command line.
#[async_trait]
pub trait TranscodeEngine: Send {
    fn name(&self) -> &str;

    // Not idempotent; callers track readiness
    async fn load(&mut self) -> Result<(), EngineError>;

    async fn write_input(&mut self, name: &str, bytes: &[u8]) -> Result<(), EngineError>;

    async fn run(&mut self, args: &[String]) -> Result<(), EngineError>;

    async fn read_output(&mut self, name: &str) -> Result<Vec<u8>, EngineError>;

    async fn remove(&mut self, name: &str) -> Result<(), EngineError>;

    /// Ends the engine lifetime and releases the virtual filesystem.
    async fn unload(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}
