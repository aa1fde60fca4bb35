use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR_NAME: &str = "cardiomed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Could not determine the user's {0} directory")]
pub struct AppPathsError(pub &'static str);

/// Where CardioMed keeps its settings, caches and clinic data.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// Logs, database dumps, medical attachments and the update lock.
    pub data_dir: PathBuf,
}

fn user_dir(
    kind: &'static str,
    lookup: fn() -> Option<PathBuf>,
) -> Result<PathBuf, AppPathsError> {
    lookup()
        .map(|base| base.join(APP_DIR_NAME))
        .ok_or(AppPathsError(kind))
}

impl AppPaths {
    /// Per-user locations, e.g. `~/.config/cardiomed` on Linux or
    /// `~/Library/Application Support/cardiomed` on macOS.
    ///
    /// # Errors
    /// Returns an error when the OS does not report one of the base
    /// directories.
    pub fn new() -> Result<Self, AppPathsError> {
        Ok(Self {
            config_dir: user_dir("config", dirs::config_dir)?,
            cache_dir: user_dir("cache", dirs::cache_dir)?,
            data_dir: user_dir("data", dirs::data_dir)?,
        })
    }

    /// Everything under one directory, for portable installs and tests.
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
        }
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("debug.log")
    }

    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// Root that stored attachment paths (`medical_files/...`) are relative to.
    #[must_use]
    pub fn medical_files_root(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn update_lock_file(&self) -> PathBuf {
        self.data_dir.join("update.lock")
    }

    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        [&self.config_dir, &self.cache_dir, &self.data_dir]
            .into_iter()
            .try_for_each(std::fs::create_dir_all)
    }
}
