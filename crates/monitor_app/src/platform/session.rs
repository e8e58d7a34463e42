use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use monitor_core::{
    update, ChannelStatus, DispatchAction, MonitorState, MonitorViewModel, Msg, Screen,
    SIDECAR_EVENT_CHANNEL,
};
use monitor_engine::{
    EngineHandle, EventBus, SettingsStore, SubscriptionManager, WorkerDispatcher, WorkerExit,
};
use monitor_logging::{monitor_debug, monitor_info, monitor_warn};

use super::effects::{describe_exit, spawn_event_forwarder, EffectRunner};
use super::ui::console::Console;
use super::ui::constants::TICK_INTERVAL_MS;
use super::ui::render::{render, render_notification, render_summary, RenderCursor};

/// Everything the session loop reacts to, in arrival order.
#[derive(Debug)]
pub enum SessionInput {
    Core(Msg),
    WorkerExited {
        action: DispatchAction,
        exit: WorkerExit,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStart {
    Jobs {
        files: Vec<PathBuf>,
        output_dir: Option<PathBuf>,
    },
    Mock,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Where to write the JSON Lines export when the session ends.
    pub export: Option<PathBuf>,
    /// Copy the event log to stdout when the session ends; `export` takes precedence.
    pub copy_logs: bool,
    pub tick: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            export: None,
            copy_logs: false,
            tick: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub setup_required: bool,
    pub channel_failed: bool,
    pub dispatched: usize,
    pub dispatch_failures: usize,
    pub events: usize,
    pub rejected: usize,
    pub interrupts: usize,
    pub worker_failures: usize,
    pub final_percent: Option<f64>,
}

impl SessionReport {
    pub fn succeeded(&self) -> bool {
        !self.setup_required
            && !self.channel_failed
            && self.dispatched > 0
            && self.dispatch_failures == 0
            && self.interrupts == 0
            && self.worker_failures == 0
    }
}

struct Session {
    state: MonitorState,
    cursor: RenderCursor,
    console: Console,
    runner: EffectRunner,
    worker_failures: usize,
}

impl Session {
    fn new(console: Console, runner: EffectRunner) -> Self {
        Self {
            state: MonitorState::new(),
            cursor: RenderCursor::default(),
            console,
            runner,
            worker_failures: 0,
        }
    }

    fn handle(&mut self, input: SessionInput) {
        match input {
            SessionInput::Core(msg) => {
                if let Msg::DispatchFinished { result: Err(_), .. } = &msg {
                    self.runner.settle();
                }
                self.dispatch_msg(msg);
            }
            SessionInput::WorkerExited { action, exit } => {
                self.runner.settle();
                if !exit.success() {
                    self.worker_failures += 1;
                }
                monitor_info!("Worker for {:?} exited: {:?}", action, exit);
                self.console
                    .write([render_notification(&describe_exit(action, &exit))]);
            }
        }
    }

    fn dispatch_msg(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (mut state, effects) = update(state, msg);
            if state.consume_dirty() {
                let view = state.view_from(self.cursor.first_unprinted(state.event_count()));
                self.console.write(render(&view, &mut self.cursor));
            }
            self.state = state;
            queue.extend(self.runner.run(effects, &mut self.console));
        }
    }

    /// View without timeline rows, for counters and status.
    fn status_view(&self) -> MonitorViewModel {
        self.state.view_from(self.state.event_count())
    }

    fn report(&self) -> SessionReport {
        let view = self.status_view();
        SessionReport {
            setup_required: view.screen == Screen::Setup,
            channel_failed: matches!(view.channel, ChannelStatus::Failed(_)),
            dispatched: self.runner.dispatched(),
            dispatch_failures: view.dispatch_failures,
            events: view.event_count,
            rejected: view.rejected_count,
            interrupts: view.interrupt_count,
            worker_failures: self.worker_failures,
            final_percent: view.global_percent,
        }
    }

    fn finish(mut self) -> SessionReport {
        let view = self.status_view();
        self.console.write(render_summary(&view));
        self.report()
    }
}

/// Runs one monitoring session: load settings, attach to the event channel,
/// start the worker and follow its events until every dispatch has settled.
pub fn run_session(
    store: &dyn SettingsStore,
    bus: Arc<EventBus>,
    dispatcher: Arc<dyn WorkerDispatcher>,
    start: SessionStart,
    options: SessionOptions,
    console: Console,
) -> SessionReport {
    let (inbox_tx, inbox_rx) = mpsc::channel::<SessionInput>();
    let (engine, events) = EngineHandle::spawn(dispatcher);
    spawn_event_forwarder(events, inbox_tx.clone());
    let mut session = Session::new(console, EffectRunner::new(engine, options.export.clone()));

    let loaded = match store.load_settings() {
        Ok(settings) => Msg::SettingsLoaded {
            first_launch: settings.first_launch,
        },
        Err(err) => Msg::SettingsLoadFailed(err.to_string()),
    };
    session.dispatch_msg(loaded);
    if session.state.screen() == Screen::Setup {
        monitor_warn!("Setup is not complete; refusing to start");
        return session.finish();
    }

    let mut subscription = SubscriptionManager::new(bus, SIDECAR_EVENT_CHANNEL);
    let listener_tx = inbox_tx.clone();
    let attached = subscription.attach(move |payload: &str| {
        let _ = listener_tx.send(SessionInput::Core(Msg::SidecarPayload(payload.to_string())));
    });
    match attached {
        Ok(()) => session.dispatch_msg(Msg::ListenerAttached),
        Err(err) => {
            session.dispatch_msg(Msg::ListenerFailed(err.to_string()));
            return session.finish();
        }
    }

    match start {
        SessionStart::Jobs { files, output_dir } => {
            session.dispatch_msg(Msg::FilesPicked(files));
            if let Some(dir) = output_dir {
                session.dispatch_msg(Msg::OutputDirPicked(dir));
            }
            session.dispatch_msg(Msg::StartJobsClicked);
        }
        SessionStart::Mock => session.dispatch_msg(Msg::StartMockClicked),
    }

    while session.runner.pending() > 0 {
        match inbox_rx.recv_timeout(options.tick) {
            Ok(input) => session.handle(input),
            Err(mpsc::RecvTimeoutError::Timeout) => session.dispatch_msg(Msg::Tick),
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    // Lines emitted before the last exit notice may still be queued.
    while let Ok(input) = inbox_rx.try_recv() {
        session.handle(input);
    }

    if options.export.is_some() || options.copy_logs {
        session.dispatch_msg(Msg::CopyLogsClicked);
    }

    match subscription.detach() {
        Ok(()) => session.dispatch_msg(Msg::ListenerDetached),
        Err(err) => session.dispatch_msg(Msg::ListenerFailed(err.to_string())),
    }
    monitor_debug!("Session finished with {} events", session.state.event_count());
    session.finish()
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::Mutex;

    use monitor_engine::{
        complete_setup, DispatchError, DispatchRequest, FileSettingsStore, Settings, WorkerRun,
    };
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    /// Emits canned lines on the bus as if a worker printed them, then exits.
    struct ScriptedWorker {
        bus: Arc<EventBus>,
        lines: Vec<&'static str>,
        code: Option<i32>,
        refuse: bool,
    }

    impl ScriptedWorker {
        fn new(bus: &Arc<EventBus>, lines: Vec<&'static str>) -> Self {
            Self {
                bus: bus.clone(),
                lines,
                code: Some(0),
                refuse: false,
            }
        }

        fn play(&self) -> Result<WorkerRun, DispatchError> {
            if self.refuse {
                return Err(DispatchError::Spawn {
                    program: "python".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "not installed"),
                });
            }
            for line in &self.lines {
                self.bus.emit(SIDECAR_EVENT_CHANNEL, line);
            }
            Ok(WorkerRun::finished(WorkerExit {
                code: self.code,
                lines_forwarded: self.lines.len(),
            }))
        }
    }

    #[async_trait::async_trait]
    impl WorkerDispatcher for ScriptedWorker {
        async fn start_jobs(&self, _request: DispatchRequest) -> Result<WorkerRun, DispatchError> {
            self.play()
        }

        async fn trigger_mock(&self) -> Result<WorkerRun, DispatchError> {
            self.play()
        }
    }

    const STAGE: &str = r#"{"type":"stage","stage":"parse","ts":"t1","fileId":"f1"}"#;
    const HALF: &str = r#"{"type":"progress","stage":"parse","ts":"t2","fileId":"f1","percent":0.5}"#;
    const DONE: &str = r#"{"type":"completed","stage":"done","ts":"t3","fileId":"f1","percent":1}"#;
    const FAILED: &str = r#"{"type":"error","stage":"ocr","ts":"t4","fileId":"f1","message":"OCR crashed"}"#;

    fn ready_store(dir: &TempDir) -> FileSettingsStore {
        let store = FileSettingsStore::new(dir.path().join("home"));
        complete_setup(&store, Settings::default(), "sk-test").unwrap();
        store
    }

    fn quiet() -> Console {
        Console::new(Box::new(io::sink()), Box::new(io::sink()))
    }

    /// Cloneable writer so a test can read back what the console printed.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn options(export: Option<PathBuf>) -> SessionOptions {
        SessionOptions {
            export,
            copy_logs: false,
            tick: Duration::from_millis(10),
        }
    }

    #[test]
    fn mock_session_follows_events_and_exports() {
        let temp = TempDir::new().unwrap();
        let store = ready_store(&temp);
        let bus = Arc::new(EventBus::new());
        let worker = ScriptedWorker::new(&bus, vec![STAGE, HALF, "not json", DONE]);
        let export = temp.path().join("out").join("events.jsonl");

        let report = run_session(
            &store,
            bus,
            Arc::new(worker),
            SessionStart::Mock,
            options(Some(export.clone())),
            quiet(),
        );

        assert_eq!(
            report,
            SessionReport {
                dispatched: 1,
                events: 3,
                rejected: 1,
                final_percent: Some(100.0),
                ..SessionReport::default()
            }
        );
        assert!(report.succeeded());
        let exported = std::fs::read_to_string(&export).unwrap();
        let lines: Vec<&str> = exported.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(r#""type":"stage""#), "{}", lines[0]);
        assert!(lines[2].contains(r#""type":"completed""#), "{}", lines[2]);
    }

    #[test]
    fn copy_logs_prints_jsonl_to_stdout() {
        let temp = TempDir::new().unwrap();
        let store = ready_store(&temp);
        let bus = Arc::new(EventBus::new());
        let worker = ScriptedWorker::new(&bus, vec![STAGE, DONE]);
        let stdout = SharedBuffer::default();

        let report = run_session(
            &store,
            bus,
            Arc::new(worker),
            SessionStart::Mock,
            SessionOptions {
                copy_logs: true,
                ..options(None)
            },
            Console::new(Box::new(stdout.clone()), Box::new(io::sink())),
        );

        assert!(report.succeeded());
        let printed = stdout.text();
        let exported: Vec<&str> = printed
            .lines()
            .filter(|line| line.starts_with('{'))
            .collect();
        assert_eq!(exported.len(), 2, "{printed}");
        assert!(exported[0].contains(r#""type":"stage""#), "{}", exported[0]);
        assert!(exported[1].contains(r#""type":"completed""#), "{}", exported[1]);
    }

    #[test]
    fn error_event_fails_the_session() {
        let temp = TempDir::new().unwrap();
        let store = ready_store(&temp);
        let bus = Arc::new(EventBus::new());
        let worker = ScriptedWorker::new(&bus, vec![STAGE, FAILED]);

        let report = run_session(
            &store,
            bus,
            Arc::new(worker),
            SessionStart::Jobs {
                files: vec![PathBuf::from("a.pdf")],
                output_dir: None,
            },
            options(None),
            quiet(),
        );

        assert_eq!(report.events, 2);
        assert_eq!(report.interrupts, 1);
        assert!(!report.succeeded());
    }

    #[test]
    fn first_launch_blocks_dispatch() {
        let temp = TempDir::new().unwrap();
        let store = FileSettingsStore::new(temp.path().join("empty"));
        let bus = Arc::new(EventBus::new());
        let worker = ScriptedWorker::new(&bus, vec![STAGE]);

        let report = run_session(
            &store,
            bus.clone(),
            Arc::new(worker),
            SessionStart::Mock,
            options(None),
            quiet(),
        );

        assert!(report.setup_required);
        assert_eq!(report.dispatched, 0);
        assert_eq!(bus.listener_count(SIDECAR_EVENT_CHANNEL), 0);
    }

    #[test]
    fn refused_dispatch_settles_without_events() {
        let temp = TempDir::new().unwrap();
        let store = ready_store(&temp);
        let bus = Arc::new(EventBus::new());
        let worker = ScriptedWorker {
            refuse: true,
            ..ScriptedWorker::new(&bus, vec![STAGE])
        };

        let report = run_session(
            &store,
            bus,
            Arc::new(worker),
            SessionStart::Jobs {
                files: vec![PathBuf::from("a.pdf"), PathBuf::from("a.pdf")],
                output_dir: Some(PathBuf::from("out")),
            },
            options(None),
            quiet(),
        );

        assert_eq!(report.dispatched, 1);
        assert_eq!(report.dispatch_failures, 1);
        assert_eq!(report.events, 0);
        assert!(!report.succeeded());
    }

    #[test]
    fn no_files_means_nothing_dispatched() {
        let temp = TempDir::new().unwrap();
        let store = ready_store(&temp);
        let bus = Arc::new(EventBus::new());
        let worker = ScriptedWorker::new(&bus, vec![STAGE]);

        let report = run_session(
            &store,
            bus.clone(),
            Arc::new(worker),
            SessionStart::Jobs {
                files: Vec::new(),
                output_dir: None,
            },
            options(None),
            quiet(),
        );

        assert_eq!(report.dispatched, 0);
        assert_eq!(report.events, 0);
        assert_eq!(bus.listener_count(SIDECAR_EVENT_CHANNEL), 0);
    }

    #[test]
    fn nonzero_worker_exit_is_a_failure() {
        let temp = TempDir::new().unwrap();
        let store = ready_store(&temp);
        let bus = Arc::new(EventBus::new());
        let worker = ScriptedWorker {
            code: Some(1),
            ..ScriptedWorker::new(&bus, vec![STAGE])
        };

        let report = run_session(
            &store,
            bus,
            Arc::new(worker),
            SessionStart::Mock,
            options(None),
            quiet(),
        );

        assert_eq!(report.events, 1);
        assert_eq!(report.worker_failures, 1);
        assert!(!report.succeeded());
    }
}
