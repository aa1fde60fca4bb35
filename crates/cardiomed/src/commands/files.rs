use std::path::Path;
use std::process::ExitCode;

use cardiomed_core::MedicalFileStore;

use crate::cli::FilesCommand;
use crate::commands::Context;
use crate::error::AppError;

pub async fn run(ctx: &Context, command: FilesCommand) -> Result<ExitCode, AppError> {
    let store = MedicalFileStore::new(&ctx.paths);

    match command {
        FilesCommand::Save { path, name } => {
            let name = match name {
                Some(name) => name,
                None => stored_name(&path)?,
            };
            let data = tokio::fs::read(&path)
                .await
                .map_err(|error| AppError::operation_failed("Read file", error))?;
            let relative = store
                .save(&data, &name)
                .await
                .map_err(|error| AppError::operation_failed("Save file", error))?;
            println!("{relative}");
        }
        FilesCommand::Export { relative, output } => {
            let data = store
                .read(&relative)
                .await
                .map_err(|error| AppError::operation_failed("Read stored file", error))?;
            tokio::fs::write(&output, &data)
                .await
                .map_err(|error| AppError::operation_failed("Export file", error))?;
            println!("Exported {relative} to {}", output.display());
        }
        FilesCommand::Open { relative } => {
            store
                .open(&relative)
                .map_err(|error| AppError::operation_failed("Open file", error))?;
        }
        FilesCommand::Delete { relative } => {
            store
                .delete(&relative)
                .await
                .map_err(|error| AppError::operation_failed("Delete file", error))?;
            println!("Deleted {relative}.");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn stored_name(path: &Path) -> Result<String, AppError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::invalid_input("path", format!("{} has no file name", path.display()))
        })
}
