use crate::conversion::{ConversionError, ConversionRequest, SharedController};
use crate::download::{Download, DownloadEmitter, DownloadReceipt};
use crate::engine::TranscodeEngine;
use crate::security::{SecurityError, SecurityValidator};
use crate::selection::{SelectedFile, SelectionState};
use crate::state::{StateError, WorkflowState};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("No file selected")]
    NoFileSelected,
    #[error("Output extension is empty")]
    MissingTargetExtension,
    #[error("Invalid output extension: {extension}")]
    InvalidTargetExtension { extension: String },
    #[error("Busy: controls are disabled")]
    Busy,
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl WorkflowError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NoFileSelected => "Pick a file to convert first.".to_string(),
            Self::MissingTargetExtension => {
                "Type the extension you want, for example mp4 or png.".to_string()
            }
            Self::InvalidTargetExtension { extension } => format!(
                "\"{}\" is not a usable extension. Use letters and digits only.",
                extension
            ),
            Self::Busy => "Please wait for the current task to finish.".to_string(),
            Self::State(e) => e.to_string(),
            Self::Conversion(e) => e.user_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFailure {
    pub message: String,
    pub engine_loaded: bool,
}

impl ConversionFailure {
    /// `engine_loaded` is read from the controller after the attempt, since
    /// some failures happen before the engine is ever touched.
    pub async fn observe<E: TranscodeEngine>(
        controller: &SharedController<E>,
        error: &ConversionError,
    ) -> Self {
        let engine_loaded = controller.lock().await.is_ready();
        Self {
            message: error.user_message(),
            engine_loaded,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingConversion {
    pub task_id: Uuid,
    pub source_path: PathBuf,
    pub base_name: String,
    pub source_extension: String,
    pub target_extension: String,
}

impl PendingConversion {
    pub async fn into_request(self) -> Result<(ConversionRequest, String), ConversionError> {
        let source_bytes = tokio::fs::read(&self.source_path)
            .await
            .map_err(|source| ConversionError::SourceRead {
                path: self.source_path.clone(),
                source,
            })?;

        let request = ConversionRequest {
            source_bytes,
            source_extension: self.source_extension,
            target_extension: self.target_extension,
        };
        Ok((request, self.base_name))
    }
}

/// Reads the source, converts it, and hands the result to `emitter`.
pub async fn execute<E, D>(
    controller: &SharedController<E>,
    emitter: &D,
    pending: PendingConversion,
) -> Result<DownloadReceipt, ConversionError>
where
    E: TranscodeEngine,
    D: DownloadEmitter + ?Sized,
{
    let (request, base_name) = pending.into_request().await?;

    let result = {
        let mut controller = controller.lock().await;
        controller.convert(request).await?
    };

    let receipt = emitter.emit(Download::new(&base_name, result)).await?;
    Ok(receipt)
}

#[derive(Debug, Default)]
pub struct ConversionWorkflow {
    pub selection: SelectionState,
    pub state: WorkflowState,
    validator: SecurityValidator,
}

impl ConversionWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), WorkflowError> {
        if !self.state.file_input_enabled() {
            return Err(WorkflowError::Busy);
        }
        self.selection.on_file_selected(file);
        self.state.clear_error();
        Ok(())
    }

    pub fn set_target_extension(&mut self, extension: &str) -> Result<(), WorkflowError> {
        if !self.state.target_input_enabled() {
            return Err(WorkflowError::Busy);
        }
        self.selection.target_extension = extension.to_string();
        Ok(())
    }

    /// Validates inputs and flips the state to converting. Nothing touches
    /// the engine when this fails.
    pub fn begin_conversion(&mut self) -> Result<PendingConversion, WorkflowError> {
        let pending = self.validate().and_then(|(file, target_extension)| {
            let task_id = Uuid::new_v4();
            self.state.start_conversion(task_id)?;
            Ok(PendingConversion {
                task_id,
                source_path: file.path,
                base_name: file.base_name,
                source_extension: file.inferred_extension,
                target_extension,
            })
        });

        match &pending {
            Ok(p) => tracing::info!(
                "Conversion {} started: {}.{} -> {}",
                p.task_id,
                p.base_name,
                p.source_extension,
                p.target_extension
            ),
            Err(e) => {
                tracing::warn!("Conversion not started: {}", e);
                self.state.set_error(e.user_message());
            }
        }

        pending
    }

    fn validate(&self) -> Result<(SelectedFile, String), WorkflowError> {
        let file = self
            .selection
            .file()
            .cloned()
            .ok_or(WorkflowError::NoFileSelected)?;

        let target = self
            .validator
            .normalize_extension(&self.selection.target_extension)
            .map_err(|e| match e {
                SecurityError::EmptyExtension => WorkflowError::MissingTargetExtension,
                _ => WorkflowError::InvalidTargetExtension {
                    extension: self.selection.target_extension.clone(),
                },
            })?;

        Ok((file, target))
    }

    /// Applies the outcome of the conversion started as `task_id`.
    pub fn finish_conversion(
        &mut self,
        task_id: Uuid,
        outcome: Result<DownloadReceipt, ConversionFailure>,
    ) {
        if self.state.task_id() != Some(task_id) {
            tracing::warn!("Ignoring outcome of unknown conversion {}", task_id);
            return;
        }

        match outcome {
            Ok(receipt) => {
                tracing::info!("Conversion {} saved to {:?}", task_id, receipt.saved_to);
                self.state.engine_ready();
                self.selection.clear_target_extension();
                self.state.complete_conversion(receipt.saved_to);
            }
            Err(failure) => {
                tracing::warn!("Conversion {} failed: {}", task_id, failure.message);
                if failure.engine_loaded {
                    self.state.engine_ready();
                }
                self.state.fail_conversion(failure.message);
            }
        }
    }

    pub async fn init_convert<E, D>(
        &mut self,
        controller: &SharedController<E>,
        emitter: &D,
    ) -> Result<DownloadReceipt, WorkflowError>
    where
        E: TranscodeEngine,
        D: DownloadEmitter + ?Sized,
    {
        let pending = self.begin_conversion()?;
        let task_id = pending.task_id;

        match execute(controller, emitter, pending).await {
            Ok(receipt) => {
                self.finish_conversion(task_id, Ok(receipt.clone()));
                Ok(receipt)
            }
            Err(e) => {
                let failure = ConversionFailure::observe(controller, &e).await;
                self.finish_conversion(task_id, Err(failure));
                Err(e.into())
            }
        }
    }
}
