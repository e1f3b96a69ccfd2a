use anyhow::bail;
use authgate_client_core::ClientSettings;
use authgate_shared::telemetry;

const APP_NAME: &str = "authgate_cli";

pub fn init(cli: &super::cli::Cli, settings: &ClientSettings) -> anyhow::Result<()> {
    let init_to_file = || -> anyhow::Result<()> {
        let (file, filename) = telemetry::create_trace_file(&settings.trace_dir, APP_NAME)?;
        let subscriber = telemetry::get_subscriber(APP_NAME.into(), "info", file);

        match telemetry::init_subscriber(subscriber) {
            Ok(_) => {
                eprintln!("Tracing started to file {filename:?}");
                Ok(())
            }
            Err(e) => {
                bail!("Failed to start tracing to file. Error: {e}");
            }
        }
    };

    if !cli.is_to_std_out {
        match init_to_file() {
            Ok(_) => return Ok(()),
            Err(e) => {
                // Fall though to logging to stderr
                eprintln!("Failed to start logging to file: {e}");
            }
        }
    }

    // Stdout carries command output so traces go to stderr
    match tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(_) => Ok(()),
        Err(e) => {
            bail!("Failed to start tracing. Error: {e}");
        }
    }
}
