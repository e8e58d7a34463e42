use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use monitor_core::{DispatchAction, Effect, Msg, Notification};
use monitor_engine::{
    AtomicFileWriter, DispatchRequest, EngineEvent, EngineEvents, EngineHandle, WorkerAction,
    WorkerExit,
};
use monitor_logging::{monitor_info, monitor_warn};

use super::session::SessionInput;
use super::ui::console::Console;
use super::ui::render::{render_error_dialog, render_notification};

/// Carries out core effects against the engine and the terminal.
pub struct EffectRunner {
    engine: Option<EngineHandle>,
    export_path: Option<PathBuf>,
    pending: usize,
    dispatched: usize,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, export_path: Option<PathBuf>) -> Self {
        Self {
            engine: Some(engine),
            export_path,
            pending: 0,
            dispatched: 0,
        }
    }

    /// A runner with no worker behind it; dispatch effects fail immediately.
    pub fn detached() -> Self {
        Self {
            engine: None,
            export_path: None,
            pending: 0,
            dispatched: 0,
        }
    }

    /// Dispatches still waiting for a refusal or a worker exit.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn settle(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    /// Runs `effects` in order and returns the messages they produce right away.
    pub fn run(&mut self, effects: Vec<Effect>, console: &mut Console) -> Vec<Msg> {
        let mut follow_ups = Vec::new();
        for effect in effects {
            match effect {
                Effect::DispatchJobs(request) => {
                    let file_count = request.inputs().len();
                    let (inputs, output_dir) = request.into_parts();
                    monitor_info!(
                        "DispatchJobs files={} output_dir={:?}",
                        file_count,
                        output_dir
                    );
                    self.dispatched += 1;
                    match &self.engine {
                        Some(engine) => {
                            engine.start_jobs(DispatchRequest { inputs, output_dir });
                            self.pending += 1;
                        }
                        None => follow_ups.push(Msg::DispatchFinished {
                            action: DispatchAction::StartJobs { file_count },
                            result: Err("worker is not available".to_string()),
                        }),
                    }
                }
                Effect::TriggerMock => {
                    monitor_info!("TriggerMock");
                    self.dispatched += 1;
                    match &self.engine {
                        Some(engine) => {
                            engine.trigger_mock();
                            self.pending += 1;
                        }
                        None => follow_ups.push(Msg::DispatchFinished {
                            action: DispatchAction::TriggerMock,
                            result: Err("worker is not available".to_string()),
                        }),
                    }
                }
                Effect::ShowErrorDialog { message } => {
                    console.write(render_error_dialog(&message));
                    // The terminal cannot hold a modal open; acknowledge and move on.
                    follow_ups.push(Msg::ErrorDialogDismissed);
                }
                Effect::Notify(notification) => {
                    console.write([render_notification(&notification)]);
                }
                Effect::ExportLog { jsonl, event_count } => {
                    self.export(&jsonl, event_count, console);
                }
            }
        }
        follow_ups
    }

    fn export(&self, jsonl: &str, event_count: usize, console: &mut Console) {
        let Some(path) = &self.export_path else {
            console.write_raw(jsonl);
            return;
        };
        let notification = match write_export(path, jsonl) {
            Ok(written) => {
                monitor_info!("Exported {} events to {:?}", event_count, written);
                Notification::info(
                    "Event log exported",
                    Some(format!("{event_count} events to {}", written.display())),
                )
            }
            Err(message) => {
                monitor_warn!("Export to {:?} failed: {}", path, message);
                Notification::failure("Failed to export event log", message)
            }
        };
        console.write([render_notification(&notification)]);
    }
}

fn write_export(path: &Path, jsonl: &str) -> Result<PathBuf, String> {
    let (writer, filename) = AtomicFileWriter::for_file(path)
        .ok_or_else(|| format!("{} is not a file path", path.display()))?;
    writer
        .write(&filename, jsonl.as_bytes())
        .map_err(|err| err.to_string())
}

/// Forwards engine events into the session inbox until either side hangs up.
pub fn spawn_event_forwarder(events: EngineEvents, inbox: mpsc::Sender<SessionInput>) {
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            let input = match event {
                EngineEvent::DispatchCompleted { action, result } => {
                    SessionInput::Core(Msg::DispatchFinished {
                        action: map_action(action),
                        result,
                    })
                }
                EngineEvent::WorkerExited { action, exit } => SessionInput::WorkerExited {
                    action: map_action(action),
                    exit,
                },
            };
            if inbox.send(input).is_err() {
                break;
            }
        }
    });
}

pub fn describe_exit(action: DispatchAction, exit: &WorkerExit) -> Notification {
    let what = match action {
        DispatchAction::StartJobs { file_count } => format!("Job run ({file_count} files)"),
        DispatchAction::TriggerMock => "Mock run".to_string(),
    };
    let detail = format!("{} lines forwarded", exit.lines_forwarded);
    match exit.code {
        Some(0) => Notification::info(format!("{what} finished"), Some(detail)),
        Some(code) => Notification::failure(
            format!("{what} exited with code {code}"),
            detail,
        ),
        None => Notification::failure(format!("{what} was terminated"), detail),
    }
}

fn map_action(action: WorkerAction) -> DispatchAction {
    match action {
        WorkerAction::StartJobs { file_count } => DispatchAction::StartJobs { file_count },
        WorkerAction::TriggerMock => DispatchAction::TriggerMock,
    }
}
