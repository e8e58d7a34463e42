use std::path::PathBuf;

use crate::{normalize_percent, ChannelStatus, Event, EventKind, Screen};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitorViewModel {
    pub screen: Screen,
    pub channel: ChannelStatus,
    /// Timeline rows; may start past the first event, see `MonitorState::view_from`.
    pub events: Vec<EventRowView>,
    pub event_count: usize,
    pub rejected_count: usize,
    pub global_percent: Option<f64>,
    pub job_ids: Vec<String>,
    pub selected_files: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// Front of the error dialog queue.
    pub error_dialog: Option<String>,
    pub queued_error_dialogs: usize,
    pub interrupt_count: usize,
    pub dispatch_failures: usize,
    pub dirty: bool,
}

/// One timeline row.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRowView {
    pub index: usize,
    pub timestamp: String,
    pub stage: String,
    pub kind: EventKind,
    pub job_id: String,
    /// Normalized to `[0, 100]`.
    pub percent: Option<f64>,
    pub message: Option<String>,
}

impl From<(usize, &Event)> for EventRowView {
    fn from((index, event): (usize, &Event)) -> Self {
        Self {
            index,
            timestamp: event.timestamp().to_string(),
            stage: event.stage().to_string(),
            kind: event.kind(),
            job_id: event.job_id().to_string(),
            percent: event.percent().map(normalize_percent),
            message: event.message().map(str::to_owned),
        }
    }
}
