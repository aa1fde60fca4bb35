use std::process::ExitCode;

use log::info;

use cardiomed_core::auto_update::{self, ApplyResult};
use cardiomed_core::UpdateSession;

use crate::cli::UpdateCommand;
use crate::commands::Context;
use crate::error::AppError;

pub async fn run(ctx: &Context, command: UpdateCommand) -> Result<ExitCode, AppError> {
    let mut session = UpdateSession::new(
        ctx.client().clone(),
        ctx.manifest_url()?,
        env!("CARGO_PKG_VERSION"),
    );

    session.check().await;
    println!("{}", session.status_text());
    if let Some(error) = session.error() {
        return Err(AppError::update_check_failed(error));
    }

    let UpdateCommand::Install { no_restart } = command else {
        if let Some(notes) = session.update().and_then(|u| u.release_notes.as_deref()) {
            println!("\n{notes}");
        }
        return Ok(ExitCode::SUCCESS);
    };

    let Some(update) = session.update() else {
        return Ok(ExitCode::SUCCESS);
    };
    if !update.is_installable() {
        return Err(AppError::auto_update_failed(
            "download",
            "no verified package is published for this platform",
        ));
    }

    let mut last_status = String::new();
    let outcome = session
        .install(&ctx.paths, |session| {
            let status = session.status_text();
            if status != last_status {
                eprintln!("{status}");
                last_status = status;
            }
        })
        .await;

    match outcome {
        Some(ApplyResult::RestartRequired) if no_restart => {
            println!("Restart CardioMed to finish the update.");
            Ok(ExitCode::SUCCESS)
        }
        Some(ApplyResult::RestartRequired) => {
            info!("Restarting after update");
            auto_update::restart_app()
                .map_err(|error| AppError::auto_update_failed("restart", error))?;
            Ok(ExitCode::SUCCESS)
        }
        Some(ApplyResult::ExitForInstaller) => Ok(ExitCode::SUCCESS),
        None => Err(AppError::auto_update_failed(
            "install",
            session.error().unwrap_or("nothing was installed"),
        )),
    }
}
