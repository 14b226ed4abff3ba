use crate::constants::{INPUT_STEM, OUTPUT_STEM};
use crate::download::DownloadError;
use crate::engine::{EngineError, TranscodeEngine};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Engine failed to load: {0}")]
    EngineLoad(#[source] EngineError),
    #[error("Conversion failed: {0}")]
    Engine(#[from] EngineError),
    #[error("Could not read {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not save the converted file: {0}")]
    Download(#[from] DownloadError),
}

impl ConversionError {
    pub fn user_message(&self) -> String {
        match self {
            Self::EngineLoad(e) => format!(
                "The conversion engine could not be started ({}). Check that FFmpeg is installed.",
                e
            ),
            Self::Engine(EngineError::OutputMissing { .. }) | Self::Engine(EngineError::RunFailed { .. }) => {
                "Conversion failed. The engine could not produce that format from this file.".to_string()
            }
            Self::Engine(e) => format!("Conversion failed: {}", e),
            Self::SourceRead { path, source } => {
                format!("Could not read {}: {}", path.display(), source)
            }
            Self::Download(DownloadError::Cancelled) => "Save was cancelled.".to_string(),
            Self::Download(e) => format!("Could not save the converted file: {}", e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source_bytes: Vec<u8>,
    pub source_extension: String,
    pub target_extension: String,
}

impl ConversionRequest {
    pub fn input_name(&self) -> String {
        format!("{}.{}", INPUT_STEM, self.source_extension)
    }

    pub fn output_name(&self) -> String {
        format!("{}.{}", OUTPUT_STEM, self.target_extension)
    }

    /// `-i <input> <output>`; codec and container follow the output name.
    pub fn engine_args(&self) -> Vec<String> {
        vec!["-i".to_string(), self.input_name(), self.output_name()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    pub target_extension: String,
}

pub type SharedController<E> = Arc<Mutex<ConversionController<E>>>;

/// Owns the engine and its readiness. `load()` is issued at most once per
/// engine lifetime no matter how many conversions run.
pub struct ConversionController<E> {
    engine: E,
    ready: bool,
}

impl<E: TranscodeEngine> ConversionController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            ready: false,
        }
    }

    pub fn shared(engine: E) -> SharedController<E> {
        Arc::new(Mutex::new(Self::new(engine)))
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub async fn ensure_ready(&mut self) -> Result<(), ConversionError> {
        if self.ready {
            return Ok(());
        }

        tracing::info!("Loading {} engine", self.engine.name());
        self.engine
            .load()
            .await
            .map_err(ConversionError::EngineLoad)?;
        self.ready = true;
        tracing::info!("{} engine ready", self.engine.name());
        Ok(())
    }

    pub async fn convert(
        &mut self,
        request: ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        self.ensure_ready().await?;

        let input = request.input_name();
        let output = request.output_name();

        let result = self.run_engine(&request, &input, &output).await;

        for name in [&input, &output] {
            if let Err(e) = self.engine.remove(name).await {
                tracing::warn!("Failed to remove virtual file {}: {}", name, e);
            }
        }

        result
    }

    async fn run_engine(
        &mut self,
        request: &ConversionRequest,
        input: &str,
        output: &str,
    ) -> Result<ConversionResult, ConversionError> {
        self.engine
            .write_input(input, &request.source_bytes)
            .await?;
        self.engine.run(&request.engine_args()).await?;
        let bytes = self.engine.read_output(output).await?;

        tracing::info!(
            "Converted {} ({} bytes) -> {} ({} bytes)",
            input,
            request.source_bytes.len(),
            output,
            bytes.len()
        );

        Ok(ConversionResult {
            bytes,
            target_extension: request.target_extension.clone(),
        })
    }

    /// Ends the engine lifetime. A later conversion starts a new one.
    pub async fn shutdown(&mut self) -> Result<(), EngineError> {
        if self.ready {
            self.engine.unload().await?;
            self.ready = false;
        }
        Ok(())
    }
}
