use std::process::ExitCode;

use log::info;

use cardiomed_core::{BackupKind, BackupManager};

use crate::cli::{BackupCommand, SettingsCommand};
use crate::commands::Context;
use crate::error::AppError;
use crate::settings::AppSettings;

pub async fn backup(ctx: &Context, command: BackupCommand) -> Result<ExitCode, AppError> {
    let manager = BackupManager::new(&ctx.paths, ctx.settings.database.clone());

    match command {
        BackupCommand::Create { automatic } => {
            let kind = if automatic {
                BackupKind::Automatic
            } else {
                BackupKind::Manual
            };
            let backup = manager
                .create(kind)
                .await
                .map_err(|error| AppError::operation_failed("Create backup", error))?;
            println!(
                "Created {} ({:.2} MB) in {}",
                backup.filename,
                backup.size_mb,
                manager.dir().display()
            );
        }
        BackupCommand::List => {
            let backups = manager
                .list()
                .await
                .map_err(|error| AppError::operation_failed("List backups", error))?;
            if backups.is_empty() {
                println!("No backups in {}", manager.dir().display());
            }
            for backup in &backups {
                let modified = backup.modified.map_or_else(
                    || "-".to_string(),
                    |time| time.format("%Y-%m-%d %H:%M").to_string(),
                );
                println!("{modified}  {:>9.2} MB  {}", backup.size_mb(), backup.filename);
            }
        }
        BackupCommand::Restore { filename } => {
            manager
                .restore(&filename)
                .await
                .map_err(|error| AppError::operation_failed("Restore backup", error))?;
            println!("Database restored from {filename}.");
        }
        BackupCommand::Delete { filename } => {
            manager
                .delete(&filename)
                .await
                .map_err(|error| AppError::operation_failed("Delete backup", error))?;
            println!("Deleted {filename}.");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn settings(ctx: &Context, command: &SettingsCommand) -> Result<ExitCode, AppError> {
    match command {
        SettingsCommand::Show => {
            let json = serde_json::to_string_pretty(&ctx.settings.redacted())
                .map_err(|error| AppError::settings_failed("serialize", error))?;
            println!("{json}");
        }
        SettingsCommand::Path => println!("{}", ctx.paths.settings_file().display()),
        SettingsCommand::Init => {
            let path = ctx.paths.settings_file();
            if path.exists() {
                println!("Settings already exist at {}", path.display());
            } else {
                AppSettings::default()
                    .save(&ctx.paths)
                    .map_err(|error| AppError::settings_failed("save", error))?;
                info!("Wrote default settings to {}", path.display());
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
