//! Attachments (scans, ECG exports, letters) stored next to the app data.
//!
//! Callers only ever see paths relative to the store root, such as
//! `medical_files/20250102_081500_ecg.pdf`.

use std::path::{Component, Path, PathBuf};

use chrono::Local;
use log::{debug, info};
use thiserror::Error;

use cardiomed_platform::AppPaths;

const FILES_DIR: &str = "medical_files";

#[derive(Error, Debug)]
pub enum FileStoreError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path escapes the medical file store: {0}")]
    OutsideStore(String),

    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct MedicalFileStore {
    root: PathBuf,
}

impl MedicalFileStore {
    #[must_use]
    pub fn new(paths: &AppPaths) -> Self {
        Self::with_root(paths.medical_files_root().to_path_buf())
    }

    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write `data` under a timestamped, sanitised name and return its
    /// relative path.
    ///
    /// # Errors
    /// Returns an error when the directory or file cannot be written.
    pub async fn save(&self, data: &[u8], filename: &str) -> Result<String, FileStoreError> {
        let dir = self.root.join(FILES_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let unique = format!(
            "{}_{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            sanitize_filename(filename)
        );
        tokio::fs::write(dir.join(&unique), data).await?;

        let relative = format!("{FILES_DIR}/{unique}");
        info!("Saved medical file {relative} ({} bytes)", data.len());
        Ok(relative)
    }

    /// # Errors
    /// Returns an error when the path leaves the store, the file is missing,
    /// or it cannot be read.
    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, FileStoreError> {
        let path = self.existing(relative)?;
        Ok(tokio::fs::read(path).await?)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    ///
    /// # Errors
    /// Returns an error when the path leaves the store or removal fails.
    pub async fn delete(&self, relative: &str) -> Result<(), FileStoreError> {
        let path = self.resolve(relative)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted medical file {relative}");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Medical file {relative} already absent");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Hand the file to the operating system's default viewer.
    ///
    /// # Errors
    /// Returns an error when the path leaves the store, the file is missing,
    /// or no handler could be launched.
    pub fn open(&self, relative: &str) -> Result<(), FileStoreError> {
        let path = self.existing(relative)?;
        open::that_detached(&path).map_err(|source| FileStoreError::Open {
            path: relative.to_string(),
            source,
        })
    }

    fn existing(&self, relative: &str) -> Result<PathBuf, FileStoreError> {
        let path = self.resolve(relative)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(FileStoreError::NotFound(relative.to_string()))
        }
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, FileStoreError> {
        let candidate = Path::new(relative);
        let stays_inside = !relative.is_empty()
            && candidate
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if stays_inside {
            Ok(self.root.join(candidate))
        } else {
            Err(FileStoreError::OutsideStore(relative.to_string()))
        }
    }
}

/// Keep ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
