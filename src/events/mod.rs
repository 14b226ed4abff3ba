use crate::download::DownloadReceipt;
use crate::workflow::ConversionFailure;
use uuid::Uuid;

/// Background work reports back to the UI thread through these.
#[derive(Debug, Clone)]
pub enum AppEvent {
    // Engine lifecycle
    EngineReady,
    EngineLoadFailed(String),

    // Conversion events
    ConversionCompleted {
        task_id: Uuid,
        receipt: DownloadReceipt,
    },
    ConversionFailed {
        task_id: Uuid,
        failure: ConversionFailure,
    },
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<AppEvent>;
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

pub fn send_event(sender: &EventSender, event: AppEvent) {
    if let Err(e) = sender.send(event) {
        tracing::error!("Failed to send event: {}", e);
    }
}
