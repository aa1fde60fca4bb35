mod bridge;
mod cli;
mod commands;
mod error;
mod logging;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use cardiomed_core::auto_update;
use cardiomed_platform::AppPaths;

use crate::cli::Cli;
use crate::commands::Context;
use crate::settings::AppSettings;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match &cli.root {
        Some(root) => AppPaths::under(root),
        None => match AppPaths::new() {
            Ok(paths) => paths,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let settings = AppSettings::load(&paths);
    logging::init_logging(
        &paths,
        cli.debug || settings.debug_logging,
        settings.max_log_size_bytes,
    );
    info!("CardioMed {} starting", env!("CARGO_PKG_VERSION"));

    auto_update::cleanup_old_app_bundle(&paths);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = Context::new(paths, settings, cli.endpoint)
        .and_then(|ctx| runtime.block_on(commands::run(cli.command, &ctx)));

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
