use monitor_logging::{monitor_debug, monitor_info, monitor_warn};

use crate::{
    classify, dedupe_paths, export_jsonl, validate_envelope, ChannelStatus, DispatchAction,
    Effect, Intent, JobRequest, MonitorState, Msg, Notification, Screen,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: MonitorState, msg: Msg) -> (MonitorState, Vec<Effect>) {
    let effects = match msg {
        Msg::SettingsLoaded { first_launch } => {
            state.set_screen(if first_launch {
                Screen::Setup
            } else {
                Screen::Monitor
            });
            Vec::new()
        }
        Msg::SettingsLoadFailed(err) => {
            monitor_warn!("Failed to load settings, showing setup: {}", err);
            state.set_screen(Screen::Setup);
            Vec::new()
        }
        Msg::SettingsSaved => {
            state.set_screen(Screen::Monitor);
            vec![Effect::Notify(Notification::info("Settings saved", None))]
        }
        Msg::SettingsSaveFailed(err) => {
            vec![Effect::Notify(Notification::failure(
                "Failed to save settings",
                err,
            ))]
        }
        Msg::ListenerAttached => {
            state.set_channel(ChannelStatus::Attached);
            Vec::new()
        }
        Msg::ListenerDetached => {
            state.set_channel(ChannelStatus::Detached);
            Vec::new()
        }
        Msg::ListenerFailed(err) => {
            state.set_channel(ChannelStatus::Failed(err.clone()));
            vec![Effect::Notify(Notification::fatal(
                "Event channel unavailable",
                err,
            ))]
        }
        Msg::SidecarPayload(raw) => ingest_payload(&mut state, &raw),
        Msg::FilesPicked(paths) => {
            let files = dedupe_paths(paths);
            if files.is_empty() {
                return (state, Vec::new());
            }
            let count = files.len();
            state.set_selected_files(files);
            vec![Effect::Notify(Notification::info(
                "Files selected",
                Some(format!("{count} files")),
            ))]
        }
        Msg::OutputDirPicked(dir) => {
            let description = dir.display().to_string();
            state.set_output_dir(dir);
            vec![Effect::Notify(Notification::info(
                "Output directory set",
                Some(description),
            ))]
        }
        Msg::StartJobsClicked => {
            if state.screen() == Screen::Setup {
                monitor_debug!("Start ignored while setup is pending");
                return (state, Vec::new());
            }
            match JobRequest::new(
                state.selected_files().iter().cloned(),
                state.output_dir().cloned(),
            ) {
                Ok(request) => vec![Effect::DispatchJobs(request)],
                Err(err) => {
                    monitor_debug!("Start ignored: {}", err);
                    Vec::new()
                }
            }
        }
        Msg::StartMockClicked => {
            if state.screen() == Screen::Setup {
                monitor_debug!("Mock trigger ignored while setup is pending");
                Vec::new()
            } else {
                vec![Effect::TriggerMock]
            }
        }
        Msg::DispatchFinished { action, result } => dispatch_finished(&mut state, action, result),
        Msg::ErrorDialogDismissed => {
            state.close_error_dialog();
            Vec::new()
        }
        Msg::ErrorDialogConfirmed => {
            if state.close_error_dialog().is_some() {
                vec![export_effect(&state)]
            } else {
                Vec::new()
            }
        }
        Msg::CopyLogsClicked => vec![export_effect(&state)],
        Msg::NewSession => {
            monitor_info!(
                "Starting new session, discarding {} events",
                state.event_count()
            );
            state.reset_session();
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn ingest_payload(state: &mut MonitorState, raw: &str) -> Vec<Effect> {
    if *state.channel() != ChannelStatus::Attached {
        monitor_debug!("Dropping payload received while the listener is not attached");
        return Vec::new();
    }

    let event = match validate_envelope(raw) {
        Ok(event) => event,
        Err(reason) => {
            monitor_debug!("Dropping sidecar payload: {}", reason);
            state.record_rejected();
            return Vec::new();
        }
    };

    // Classify once, at append time, so re-rendering never re-fires an interrupt.
    let intent = classify(&event);
    state.append_event(event);

    match intent {
        Some(Intent::Interrupt { message }) => {
            monitor_warn!("Sidecar reported error: {}", message);
            state.open_error_dialog(message.clone());
            vec![Effect::ShowErrorDialog { message }]
        }
        None => Vec::new(),
    }
}

fn dispatch_finished(
    state: &mut MonitorState,
    action: DispatchAction,
    result: Result<(), String>,
) -> Vec<Effect> {
    let notification = match (action, result) {
        (DispatchAction::StartJobs { file_count }, Ok(())) => {
            monitor_info!("Jobs started for {} files", file_count);
            Notification::info("Jobs started", Some(format!("{file_count} files")))
        }
        (DispatchAction::TriggerMock, Ok(())) => {
            monitor_info!("Mock job triggered");
            Notification::info("Mock job triggered", None)
        }
        (DispatchAction::StartJobs { .. }, Err(err)) => {
            monitor_warn!("Failed to start jobs: {}", err);
            state.record_dispatch_failure();
            Notification::failure("Failed to start jobs", err)
        }
        (DispatchAction::TriggerMock, Err(err)) => {
            monitor_warn!("Failed to trigger mock job: {}", err);
            state.record_dispatch_failure();
            Notification::failure("Failed to trigger mock job", err)
        }
    };
    vec![Effect::Notify(notification)]
}

fn export_effect(state: &MonitorState) -> Effect {
    let events = state.snapshot();
    Effect::ExportLog {
        jsonl: export_jsonl(events),
        event_count: events.len(),
    }
}
