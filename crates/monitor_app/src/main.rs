mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    platform::logging::initialize(cli.log_file.clone(), cli.verbose);

    match platform::run_app(cli) {
        Ok(code) => code,
        Err(err) => {
            monitor_logging::monitor_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
