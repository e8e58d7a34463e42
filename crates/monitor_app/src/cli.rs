use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_SETTINGS_DIR: &str = ".sidecar_monitor";

#[derive(Debug, Parser)]
#[command(
    name = "sidecar-monitor",
    version,
    about = "Start sidecar jobs and follow their event stream"
)]
pub struct Cli {
    /// Directory holding settings.ron and the API key.
    #[arg(long, global = true, env = "SIDECAR_MONITOR_HOME")]
    pub settings_dir: Option<PathBuf>,

    /// Worker executable (default: python).
    #[arg(long, global = true)]
    pub worker_program: Option<String>,

    /// Argument placed before the per-run arguments; repeat for several.
    #[arg(long = "worker-arg", global = true, allow_hyphen_values = true)]
    pub worker_args: Vec<String>,

    /// Input handed to the worker in mock mode.
    #[arg(long, global = true)]
    pub mock_input: Option<PathBuf>,

    /// Working directory for the worker process.
    #[arg(long, global = true)]
    pub worker_dir: Option<PathBuf>,

    /// Write the session's event log as JSON Lines when the session ends.
    #[arg(long, global = true)]
    pub export: Option<PathBuf>,

    /// Print the session's event log to stdout as JSON Lines when the session ends.
    #[arg(long, global = true, conflicts_with = "export")]
    pub copy_logs: bool,

    /// Log file path (default: ./sidecar_monitor.log).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Also log to the terminal, at debug level.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start processing the given files and monitor until the worker exits.
    Run {
        files: Vec<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Trigger the worker's mock pipeline and monitor it.
    Mock,
    /// Validate and save settings, completing first-launch setup.
    Settings {
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        ocr: Option<bool>,
        /// Required unless a key was saved before.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Print the current settings.
    ShowSettings,
}

impl Cli {
    pub fn settings_dir(&self) -> PathBuf {
        self.settings_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_DIR))
    }
}
