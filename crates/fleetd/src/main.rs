use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let config = fleet_config::Config::parse();
    let handle = match fleetd::bootstrap(config).and_then(fleetd::Daemon::serve) {
        Ok(handle) => handle,
        Err(error) => {
            eprintln!("fleetd: {error}");
            return ExitCode::FAILURE;
        }
    };
    match handle.join() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("fleetd: {error}");
            ExitCode::FAILURE
        }
    }
}
