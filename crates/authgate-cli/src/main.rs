#![warn(clippy::all, rust_2018_idioms)]

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = authgate_cli::cli::Cli::parse();

    let settings = match authgate_client_core::get_configuration() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to read configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = authgate_cli::tracing::init(&cli, &settings) {
        eprintln!("Failed to start tracing: {e}");
    }

    match authgate_cli::commands::run(cli.command, &settings) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
