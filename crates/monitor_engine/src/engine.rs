use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use monitor_logging::{monitor_error, monitor_info, monitor_warn};

use crate::worker::{DispatchRequest, WorkerDispatcher, WorkerExit};

/// Which dispatch an engine event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerAction {
    StartJobs { file_count: usize },
    TriggerMock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The worker boundary acknowledged (or refused) a dispatch.
    DispatchCompleted {
        action: WorkerAction,
        result: Result<(), String>,
    },
    /// A successfully dispatched worker has exited.
    WorkerExited {
        action: WorkerAction,
        exit: WorkerExit,
    },
}

enum EngineCommand {
    StartJobs(DispatchRequest),
    TriggerMock,
}

/// Sends dispatch commands to a background thread that owns the async runtime.
///
/// Dispatches never block the caller; results come back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Receiving half of the engine's event stream.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn spawn(dispatcher: Arc<dyn WorkerDispatcher>) -> (Self, EngineEvents) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || run_engine(dispatcher, cmd_rx, event_tx));

        (Self { cmd_tx }, EngineEvents { event_rx })
    }

    pub fn start_jobs(&self, request: DispatchRequest) {
        self.send(EngineCommand::StartJobs(request));
    }

    pub fn trigger_mock(&self) {
        self.send(EngineCommand::TriggerMock);
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            monitor_error!("Engine thread is gone; dispatch dropped");
        }
    }
}

impl EngineEvents {
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Blocks until the next event; `None` once the engine has shut down.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

fn run_engine(
    dispatcher: Arc<dyn WorkerDispatcher>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            monitor_error!("Failed to start engine runtime: {}", err);
            while let Ok(command) = cmd_rx.recv() {
                let _ = event_tx.send(EngineEvent::DispatchCompleted {
                    action: action_of(&command),
                    result: Err(format!("engine runtime unavailable: {err}")),
                });
            }
            return;
        }
    };

    let mut in_flight = Vec::new();
    while let Ok(command) = cmd_rx.recv() {
        let dispatcher = Arc::clone(&dispatcher);
        let event_tx = event_tx.clone();
        in_flight.retain(|task: &tokio::task::JoinHandle<()>| !task.is_finished());
        in_flight.push(runtime.spawn(async move {
            handle_command(dispatcher.as_ref(), command, event_tx).await;
        }));
    }

    // The handle is gone; let running workers finish and report their exit.
    runtime.block_on(async {
        for task in in_flight {
            let _ = task.await;
        }
    });
}

fn action_of(command: &EngineCommand) -> WorkerAction {
    match command {
        EngineCommand::StartJobs(request) => WorkerAction::StartJobs {
            file_count: request.inputs.len(),
        },
        EngineCommand::TriggerMock => WorkerAction::TriggerMock,
    }
}

async fn handle_command(
    dispatcher: &dyn WorkerDispatcher,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let action = action_of(&command);
    let result = match command {
        EngineCommand::StartJobs(request) => dispatcher.start_jobs(request).await,
        EngineCommand::TriggerMock => dispatcher.trigger_mock().await,
    };

    let run = match result {
        Ok(run) => {
            monitor_info!("Dispatch {:?} acknowledged", action);
            let _ = event_tx.send(EngineEvent::DispatchCompleted {
                action,
                result: Ok(()),
            });
            run
        }
        Err(err) => {
            monitor_warn!("Dispatch {:?} failed: {}", action, err);
            let _ = event_tx.send(EngineEvent::DispatchCompleted {
                action,
                result: Err(err.to_string()),
            });
            return;
        }
    };

    let exit = run.wait().await;
    let _ = event_tx.send(EngineEvent::WorkerExited { action, exit });
}
