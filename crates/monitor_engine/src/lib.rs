//! Sidecar monitor engine: the event bus and listener handle, the worker
//! dispatch boundary, settings storage and atomic persistence.
mod bus;
mod engine;
mod persist;
mod settings;
mod subscription;
mod worker;

pub use bus::{BusError, EventBus, EventSource, Listener, ListenerId};
pub use engine::{EngineEvent, EngineEvents, EngineHandle, WorkerAction};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use settings::{
    complete_setup, validate_settings, FileSettingsStore, Settings, SettingsError,
    SettingsStore, API_KEY_FILENAME, DEFAULT_BASE_URL, DEFAULT_MODEL, SETTINGS_FILENAME,
};
pub use subscription::{SubscriptionError, SubscriptionManager, SubscriptionState};
pub use worker::{
    DispatchError, DispatchRequest, SidecarWorker, WorkerConfig, WorkerDispatcher, WorkerExit,
    WorkerRun,
};
