use crate::{JobRequest, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send exactly one start request to the worker boundary.
    DispatchJobs(JobRequest),
    /// Ask the worker boundary for a mock run.
    TriggerMock,
    /// Interrupt the user; one per accepted error event.
    ShowErrorDialog { message: String },
    /// Non-blocking notification.
    Notify(Notification),
    /// Hand the exported event log to the platform (clipboard or file).
    ExportLog { jsonl: String, event_count: usize },
}
