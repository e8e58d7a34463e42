//! Sidecar monitor core: event validation, the session log, progress
//! aggregation, classification and the pure session state machine.
mod classify;
mod effect;
mod event;
mod event_log;
mod export;
mod job;
mod msg;
mod notification;
mod progress;
mod state;
mod update;
mod view_model;

pub use classify::{classify, Intent, UNKNOWN_ERROR_MESSAGE};
pub use effect::Effect;
pub use event::{validate_envelope, Event, EventKind, RejectReason};
pub use event_log::EventLog;
pub use export::export_jsonl;
pub use job::{dedupe_paths, DispatchAction, JobRequest, JobRequestError};
pub use msg::Msg;
pub use notification::{Notification, NotificationLevel};
pub use progress::{global_percent, normalize_percent};
pub use state::{ChannelStatus, MonitorState, Screen};
pub use update::update;
pub use view_model::{EventRowView, MonitorViewModel};

/// Name of the channel the sidecar's events arrive on.
pub const SIDECAR_EVENT_CHANNEL: &str = "sidecar-event";
