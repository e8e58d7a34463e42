use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use futures_util::StreamExt;
use monitor_logging::{monitor_debug, monitor_info, monitor_warn};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio_util::codec::{FramedRead, LinesCodec};

use crate::bus::EventBus;

/// Inputs for one worker start. Built from an already validated job request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub inputs: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no input files")]
    NoInputs,
    #[error("failed to spawn worker {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("worker stdout was not captured")]
    MissingStdout,
}

/// How a worker process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    /// Exit code, `None` when killed by a signal or when waiting failed.
    pub code: Option<i32>,
    /// Number of non-empty output lines forwarded to the event channel.
    pub lines_forwarded: usize,
}

impl WorkerExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A dispatched worker run; resolves when the process has exited.
#[derive(Debug)]
pub struct WorkerRun {
    exit: oneshot::Receiver<WorkerExit>,
}

impl WorkerRun {
    pub fn new(exit: oneshot::Receiver<WorkerExit>) -> Self {
        Self { exit }
    }

    /// A run that has already ended with `exit`.
    pub fn finished(exit: WorkerExit) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(exit);
        Self { exit: rx }
    }

    pub async fn wait(self) -> WorkerExit {
        self.exit.await.unwrap_or(WorkerExit {
            code: None,
            lines_forwarded: 0,
        })
    }
}

/// Boundary to the external worker. Both calls acknowledge as soon as the worker is running.
#[async_trait::async_trait]
pub trait WorkerDispatcher: Send + Sync {
    async fn start_jobs(&self, request: DispatchRequest) -> Result<WorkerRun, DispatchError>;
    async fn trigger_mock(&self) -> Result<WorkerRun, DispatchError>;
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub program: String,
    /// Arguments placed before the per-run arguments.
    pub base_args: Vec<String>,
    /// Input passed to the worker in mock mode.
    pub mock_input: PathBuf,
    pub working_dir: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            base_args: vec!["-m".to_string(), "sidecar.main".to_string()],
            mock_input: PathBuf::from("tmp/a.pdf"),
            working_dir: None,
        }
    }
}

/// Runs the sidecar as a child process and forwards each stdout line to a bus channel.
pub struct SidecarWorker {
    config: WorkerConfig,
    bus: Arc<EventBus>,
    channel: String,
}

impl SidecarWorker {
    pub fn new(config: WorkerConfig, bus: Arc<EventBus>, channel: impl Into<String>) -> Self {
        Self {
            config,
            bus,
            channel: channel.into(),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn spawn(&self, run_args: Vec<OsString>) -> Result<WorkerRun, DispatchError> {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.base_args)
            .args(&run_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| DispatchError::Spawn {
            program: self.config.program.clone(),
            source,
        })?;
        let stdout = child.stdout.take().ok_or(DispatchError::MissingStdout)?;
        monitor_info!(
            "Spawned worker {} pid={:?} args={:?}",
            self.config.program,
            child.id(),
            run_args
        );

        let (exit_tx, exit_rx) = oneshot::channel();
        let bus = Arc::clone(&self.bus);
        let channel = self.channel.clone();
        tokio::spawn(async move {
            let mut lines = FramedRead::new(stdout, LinesCodec::new());
            let mut lines_forwarded = 0;
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) if line.trim().is_empty() => {}
                    Ok(line) => {
                        bus.emit(&channel, &line);
                        lines_forwarded += 1;
                    }
                    Err(err) => {
                        monitor_warn!("Stopped reading worker output: {}", err);
                        break;
                    }
                }
            }

            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(err) => {
                    monitor_warn!("Failed to wait for worker: {}", err);
                    None
                }
            };
            monitor_debug!(
                "Worker exited code={:?} lines={}",
                code,
                lines_forwarded
            );
            let _ = exit_tx.send(WorkerExit {
                code,
                lines_forwarded,
            });
        });

        Ok(WorkerRun::new(exit_rx))
    }
}

#[async_trait::async_trait]
impl WorkerDispatcher for SidecarWorker {
    async fn start_jobs(&self, request: DispatchRequest) -> Result<WorkerRun, DispatchError> {
        if request.inputs.is_empty() {
            return Err(DispatchError::NoInputs);
        }
        let mut args: Vec<OsString> = vec!["--inputs".into()];
        args.extend(request.inputs.into_iter().map(PathBuf::into_os_string));
        if let Some(dir) = request.output_dir {
            args.push("--output-dir".into());
            args.push(dir.into_os_string());
        }
        self.spawn(args)
    }

    async fn trigger_mock(&self) -> Result<WorkerRun, DispatchError> {
        let args: Vec<OsString> = vec![
            "--mock".into(),
            "--input".into(),
            self.config.mock_input.clone().into_os_string(),
        ];
        self.spawn(args)
    }
}
