use crate::config::AppConfig;
use crate::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::conversion::SharedController;
use crate::download::FsDownloadEmitter;
use crate::engine::FfmpegProcessEngine;
use crate::events::{create_event_channel, send_event, AppEvent, EventReceiver, EventSender};
use crate::selection::SelectedFile;
use crate::workflow::{self, ConversionFailure, ConversionWorkflow};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct MediaConverterApp {
    pub workflow: ConversionWorkflow,
    pub config: AppConfig,
    controller: SharedController<FfmpegProcessEngine>,
    emitter: Arc<FsDownloadEmitter>,
    runtime: Handle,
    event_sender: EventSender,
    event_receiver: EventReceiver,
}

impl MediaConverterApp {
    pub fn new(
        config: AppConfig,
        controller: SharedController<FfmpegProcessEngine>,
        runtime: Handle,
    ) -> Self {
        let (event_sender, event_receiver) = create_event_channel();
        let emitter = Arc::new(FsDownloadEmitter::from_config(&config));

        let mut app = Self {
            workflow: ConversionWorkflow::new(),
            config,
            controller,
            emitter,
            runtime,
            event_sender,
            event_receiver,
        };

        app.load_engine();
        app
    }

    /// Eager startup load. Conversions still load lazily if this fails.
    fn load_engine(&mut self) {
        self.workflow.state.engine_loading();

        let controller = self.controller.clone();
        let sender = self.event_sender.clone();
        self.runtime.spawn(async move {
            let loaded = controller.lock().await.ensure_ready().await;
            match loaded {
                Ok(()) => send_event(&sender, AppEvent::EngineReady),
                Err(e) => {
                    tracing::error!("Engine failed to load: {}", e);
                    send_event(&sender, AppEvent::EngineLoadFailed(e.user_message()));
                }
            }
        });
    }

    pub fn select_input(&mut self) {
        if !self.workflow.state.file_input_enabled() {
            return;
        }

        let media: Vec<&str> = IMAGE_EXTENSIONS
            .iter()
            .chain(VIDEO_EXTENSIONS.iter())
            .copied()
            .collect();
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Images and videos", &media[..])
            .add_filter("All files", &["*"]);

        if let Some(ref dir) = self.config.last_input_dir {
            dialog = dialog.set_directory(dir);
        }

        let Some(path) = dialog.pick_file() else {
            return;
        };

        match SelectedFile::from_path(&path) {
            Ok(file) => {
                if let Err(e) = self.workflow.select_file(file) {
                    self.workflow.state.set_error(e.user_message());
                    return;
                }
                self.config.update_last_input_dir(&path);
                if let Err(e) = self.config.save() {
                    tracing::warn!("Failed to save config: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Cannot use {:?}: {}", path, e);
                self.workflow.state.set_error(e.to_string());
            }
        }
    }

    pub fn start_conversion(&mut self) {
        let pending = match self.workflow.begin_conversion() {
            Ok(pending) => pending,
            // Already recorded on the workflow state for display
            Err(_) => return,
        };

        let controller = self.controller.clone();
        let emitter = self.emitter.clone();
        let sender = self.event_sender.clone();
        self.runtime.spawn(async move {
            let task_id = pending.task_id;
            let event = match workflow::execute(&controller, emitter.as_ref(), pending).await {
                Ok(receipt) => AppEvent::ConversionCompleted { task_id, receipt },
                Err(e) => {
                    tracing::error!("Conversion {} failed: {}", task_id, e);
                    AppEvent::ConversionFailed {
                        task_id,
                        failure: ConversionFailure::observe(&controller, &e).await,
                    }
                }
            };
            send_event(&sender, event);
        });
    }

    pub fn update_status(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                AppEvent::EngineReady => self.workflow.state.engine_ready(),
                AppEvent::EngineLoadFailed(error) => self.workflow.state.engine_failed(error),
                AppEvent::ConversionCompleted { task_id, receipt } => {
                    self.workflow.finish_conversion(task_id, Ok(receipt));
                }
                AppEvent::ConversionFailed { task_id, failure } => {
                    self.workflow.finish_conversion(task_id, Err(failure));
                }
            }
        }
    }
}
