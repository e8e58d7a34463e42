//! Logging setup for the sidecar-monitor binary.
//!
//! Logs go to `./sidecar_monitor.log` unless `--log-file` says otherwise;
//! `--verbose` mirrors them to the terminal at debug level.

use std::path::PathBuf;

use log::LevelFilter;
use monitor_logging::{LogDestination, DEFAULT_LOG_FILE};

pub fn initialize(log_file: Option<PathBuf>, verbose: bool) {
    let path = log_file.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let (destination, level) = if verbose {
        (LogDestination::Both(path), LevelFilter::Debug)
    } else {
        (LogDestination::File(path), LevelFilter::Info)
    };
    if !monitor_logging::initialize(destination, level) {
        eprintln!("Warning: logging is disabled for this run");
    }
}
