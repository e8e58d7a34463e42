mod effects;
pub mod logging;
mod session;
mod setup;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use monitor_core::SIDECAR_EVENT_CHANNEL;
use monitor_engine::{
    EventBus, FileSettingsStore, SettingsStore, SidecarWorker, WorkerConfig,
};
use monitor_logging::monitor_info;

use crate::cli::{Cli, Command};
use session::{run_session, SessionOptions, SessionStart};
use setup::{describe_settings, run_setup, SettingsOverrides};
use ui::console::Console;

/// Exit code for a session that ran but saw errors.
const EXIT_SESSION_FAILED: u8 = 1;
/// Exit code when nothing could be started.
const EXIT_NOT_STARTED: u8 = 2;

pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let store = FileSettingsStore::new(cli.settings_dir());
    monitor_info!("Using settings directory {:?}", store.dir());

    match cli.command.clone() {
        Command::Run { files, output_dir } => {
            monitor(&cli, &store, SessionStart::Jobs { files, output_dir })
        }
        Command::Mock => monitor(&cli, &store, SessionStart::Mock),
        Command::Settings {
            model,
            base_url,
            ocr,
            api_key,
        } => {
            let overrides = SettingsOverrides {
                model,
                base_url,
                ocr,
                api_key,
            };
            let saved = run_setup(&store, &overrides, &mut Console::stdio());
            Ok(if saved {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_NOT_STARTED)
            })
        }
        Command::ShowSettings => {
            let settings = store
                .load_settings()
                .with_context(|| format!("failed to load settings from {:?}", store.dir()))?;
            let api_key = store
                .load_api_key()
                .with_context(|| format!("failed to read API key from {:?}", store.dir()))?;
            for line in describe_settings(&settings, api_key.as_deref()) {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn monitor(cli: &Cli, store: &dyn SettingsStore, start: SessionStart) -> anyhow::Result<ExitCode> {
    let bus = Arc::new(EventBus::new());
    let worker = SidecarWorker::new(worker_config(cli), bus.clone(), SIDECAR_EVENT_CHANNEL);
    let options = SessionOptions {
        export: cli.export.clone(),
        copy_logs: cli.copy_logs,
        ..SessionOptions::default()
    };

    let report = run_session(
        store,
        bus,
        Arc::new(worker),
        start,
        options,
        Console::stdio(),
    );
    monitor_info!(
        "Session finished: events={} rejected={} progress={:?}",
        report.events,
        report.rejected,
        report.final_percent
    );

    if report.setup_required {
        eprintln!("Setup is required first: run `sidecar-monitor settings --api-key <KEY>`");
        return Ok(ExitCode::from(EXIT_NOT_STARTED));
    }
    if report.dispatched == 0 && !report.channel_failed {
        eprintln!("Nothing to start: no input files were given");
        return Ok(ExitCode::from(EXIT_NOT_STARTED));
    }
    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_SESSION_FAILED)
    })
}

fn worker_config(cli: &Cli) -> WorkerConfig {
    let defaults = WorkerConfig::default();
    WorkerConfig {
        program: cli.worker_program.clone().unwrap_or(defaults.program),
        base_args: if cli.worker_args.is_empty() {
            defaults.base_args
        } else {
            cli.worker_args.clone()
        },
        mock_input: cli.mock_input.clone().unwrap_or(defaults.mock_input),
        working_dir: cli.worker_dir.clone(),
    }
}
