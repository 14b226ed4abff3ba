use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("A conversion is already in progress: {task_id}")]
    AlreadyConverting { task_id: Uuid },
    #[error("The conversion engine is still loading")]
    EngineLoading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineStatus {
    #[default]
    Unready,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConversionPhase {
    #[default]
    Idle,
    Converting {
        task_id: Uuid,
        started_at: Instant,
    },
}

/// Everything the UI needs to decide what is clickable.
///
/// Busy covers both an in-flight conversion and an in-flight engine load,
/// and every control is disabled while busy.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    engine: EngineStatus,
    phase: ConversionPhase,
    last_error: Option<String>,
    last_saved: Option<PathBuf>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine_status(&self) -> EngineStatus {
        self.engine
    }

    pub fn is_converting(&self) -> bool {
        matches!(self.phase, ConversionPhase::Converting { .. })
    }

    pub fn is_busy(&self) -> bool {
        self.is_converting() || self.engine == EngineStatus::Loading
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.is_busy()
    }

    pub fn file_input_enabled(&self) -> bool {
        !self.is_busy()
    }

    pub fn target_input_enabled(&self) -> bool {
        !self.is_busy()
    }

    pub fn task_id(&self) -> Option<Uuid> {
        match self.phase {
            ConversionPhase::Converting { task_id, .. } => Some(task_id),
            ConversionPhase::Idle => None,
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self.phase {
            ConversionPhase::Converting { started_at, .. } => Some(started_at.elapsed()),
            ConversionPhase::Idle => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_saved(&self) -> Option<&PathBuf> {
        self.last_saved.as_ref()
    }

    pub fn set_error(&mut self, error: String) {
        self.last_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn engine_loading(&mut self) {
        if self.engine == EngineStatus::Unready {
            self.engine = EngineStatus::Loading;
        }
    }

    pub fn engine_ready(&mut self) {
        self.engine = EngineStatus::Ready;
    }

    pub fn engine_failed(&mut self, error: String) {
        if self.engine == EngineStatus::Loading {
            self.engine = EngineStatus::Unready;
        }
        self.last_error = Some(error);
    }

    pub fn start_conversion(&mut self, task_id: Uuid) -> Result<(), StateError> {
        if let Some(current) = self.task_id() {
            return Err(StateError::AlreadyConverting { task_id: current });
        }
        if self.engine == EngineStatus::Loading {
            return Err(StateError::EngineLoading);
        }

        self.phase = ConversionPhase::Converting {
            task_id,
            started_at: Instant::now(),
        };
        self.last_error = None;
        self.last_saved = None;
        Ok(())
    }

    pub fn complete_conversion(&mut self, saved_to: PathBuf) {
        self.phase = ConversionPhase::Idle;
        self.last_saved = Some(saved_to);
    }

    pub fn fail_conversion(&mut self, error: String) {
        self.phase = ConversionPhase::Idle;
        self.last_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_lifecycle() {
        let mut state = WorkflowState::new();
        assert_eq!(state.engine_status(), EngineStatus::Unready);
        assert!(state.trigger_enabled());

        state.engine_loading();
        assert!(state.is_busy());
        assert!(!state.trigger_enabled());
        assert!(!state.file_input_enabled());

        state.engine_ready();
        assert_eq!(state.engine_status(), EngineStatus::Ready);
        assert!(state.trigger_enabled());

        // Ready never regresses to loading
        state.engine_loading();
        assert_eq!(state.engine_status(), EngineStatus::Ready);
    }

    #[test]
    fn test_failed_load_returns_to_unready() {
        let mut state = WorkflowState::new();
        state.engine_loading();
        state.engine_failed("no ffmpeg".into());

        assert_eq!(state.engine_status(), EngineStatus::Unready);
        assert!(state.trigger_enabled());
        assert_eq!(state.last_error(), Some("no ffmpeg"));
    }

    #[test]
    fn test_busy_gates_every_control() {
        let mut state = WorkflowState::new();
        state.engine_ready();
        let id = Uuid::new_v4();
        state.start_conversion(id).unwrap();

        assert!(state.is_converting());
        assert_eq!(state.task_id(), Some(id));
        assert!(!state.trigger_enabled());
        assert!(!state.file_input_enabled());
        assert!(!state.target_input_enabled());

        assert_eq!(
            state.start_conversion(Uuid::new_v4()),
            Err(StateError::AlreadyConverting { task_id: id })
        );
    }

    #[test]
    fn test_idle_converting_idle() {
        let mut state = WorkflowState::new();
        state.start_conversion(Uuid::new_v4()).unwrap();
        state.complete_conversion(PathBuf::from("/tmp/sample.mp4"));
        assert!(!state.is_busy());
        assert_eq!(state.last_saved(), Some(&PathBuf::from("/tmp/sample.mp4")));

        state.start_conversion(Uuid::new_v4()).unwrap();
        assert!(state.last_saved().is_none());
        state.fail_conversion("boom".into());
        assert!(!state.is_busy());
        assert_eq!(state.last_error(), Some("boom"));
    }

    #[test]
    fn test_cannot_start_while_engine_loading() {
        let mut state = WorkflowState::new();
        state.engine_loading();
        assert_eq!(
            state.start_conversion(Uuid::new_v4()),
            Err(StateError::EngineLoading)
        );
    }
}
