use crate::{Event, EventKind};

/// Shown when an error event arrives without a message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Side effect requested by a single accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Interrupt the user with a blocking error dialog.
    Interrupt { message: String },
}

pub fn classify(event: &Event) -> Option<Intent> {
    match event.kind() {
        EventKind::Error => Some(Intent::Interrupt {
            message: event
                .message()
                .unwrap_or(UNKNOWN_ERROR_MESSAGE)
                .to_string(),
        }),
        EventKind::Stage
        | EventKind::Progress
        | EventKind::Warning
        | EventKind::Metric
        | EventKind::Completed => None,
    }
}
