use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Settings collaborator finished the initial load.
    SettingsLoaded { first_launch: bool },
    /// Settings could not be loaded; the setup flow is shown instead.
    SettingsLoadFailed(String),
    /// User saved settings from the setup flow.
    SettingsSaved,
    /// Saving settings failed.
    SettingsSaveFailed(String),
    /// The `sidecar-event` listener is registered.
    ListenerAttached,
    /// The listener was removed on teardown.
    ListenerDetached,
    /// Registering or removing the listener failed.
    ListenerFailed(String),
    /// Raw text delivered on the event channel.
    SidecarPayload(String),
    /// User picked input files.
    FilesPicked(Vec<PathBuf>),
    /// User picked an output directory.
    OutputDirPicked(PathBuf),
    /// User clicked Start.
    StartJobsClicked,
    /// User clicked the mock trigger.
    StartMockClicked,
    /// Worker boundary acknowledged or refused a dispatch.
    DispatchFinished {
        action: crate::DispatchAction,
        result: Result<(), String>,
    },
    /// User closed the front error dialog.
    ErrorDialogDismissed,
    /// User confirmed the front error dialog, which also copies the log.
    ErrorDialogConfirmed,
    /// User asked for a copy of the event log.
    CopyLogsClicked,
    /// Start a new batch with an empty log.
    NewSession,
    /// Idle tick from the session loop.
    Tick,
}
