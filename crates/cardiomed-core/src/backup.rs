use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use which::which;

use cardiomed_platform::{AppPaths, tool_command};

const BACKUP_PREFIX: &str = "cardio_backup_";
const BACKUP_EXTENSION: &str = "sql";

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("{tool} not found in PATH; install the MySQL client tools")]
    ToolNotFound { tool: &'static str },

    #[error("{tool} failed: {stderr}")]
    CommandFailed { tool: &'static str, stderr: String },

    #[error("Invalid backup file name: {0:?}")]
    InvalidFilename(String),

    #[error("Backup file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Connection used by the dump and restore tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "cardio".to_string(),
        }
    }
}

impl DatabaseConfig {
    fn connection_args(&self) -> Vec<String> {
        vec![
            "-h".to_string(),
            self.host.clone(),
            "-P".to_string(),
            self.port.to_string(),
            "-u".to_string(),
            self.user.clone(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupKind {
    Automatic,
    Manual,
}

/// Result of a successful dump.
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    pub filename: String,
    pub size_mb: f64,
    pub path: PathBuf,
    pub kind: BackupKind,
    pub timestamp: DateTime<Local>,
}

/// A dump found in the backups directory.
#[derive(Debug, Clone, Serialize)]
pub struct BackupFile {
    pub filename: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

impl BackupFile {
    #[must_use]
    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.size_bytes)
    }
}

#[allow(clippy::cast_precision_loss)]
fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

pub struct BackupManager {
    dir: PathBuf,
    db: DatabaseConfig,
}

impl BackupManager {
    #[must_use]
    pub fn new(paths: &AppPaths, db: DatabaseConfig) -> Self {
        Self::with_dir(paths.backups_dir(), db)
    }

    #[must_use]
    pub fn with_dir(dir: PathBuf, db: DatabaseConfig) -> Self {
        Self { dir, db }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Dump the database into a new timestamped file.
    ///
    /// # Errors
    /// Returns an error when `mysqldump` is missing or fails, or the dump
    /// cannot be written.
    pub async fn create(&self, kind: BackupKind) -> Result<BackupInfo, BackupError> {
        let tool = find_tool("mysqldump")?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let timestamp = Local::now();
        let filename = format!(
            "{BACKUP_PREFIX}{}.{BACKUP_EXTENSION}",
            timestamp.format("%Y%m%d_%H%M%S")
        );
        let path = self.dir.join(&filename);

        info!("Creating {kind:?} backup {filename}");
        let output = tool_command(&tool)
            .args(self.dump_args())
            .env("MYSQL_PWD", &self.db.password)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!("mysqldump failed: stderr='{stderr}'");
            return Err(BackupError::CommandFailed {
                tool: "mysqldump",
                stderr,
            });
        }

        tokio::fs::write(&path, &output.stdout).await?;
        let size = tokio::fs::metadata(&path).await?.len();
        debug!("Backup written to {} ({size} bytes)", path.display());

        Ok(BackupInfo {
            filename,
            size_mb: bytes_to_mb(size),
            path,
            kind,
            timestamp,
        })
    }

    fn dump_args(&self) -> Vec<String> {
        let mut args = self.db.connection_args();
        args.extend(
            ["--single-transaction", "--routines", "--triggers"]
                .iter()
                .map(ToString::to_string),
        );
        args.push(self.db.database.clone());
        args
    }

    /// Feed a dump back into the database.
    ///
    /// # Errors
    /// Returns an error when the file name is invalid or missing, or when
    /// `mysql` is missing or fails.
    pub async fn restore(&self, filename: &str) -> Result<(), BackupError> {
        let path = self.existing_file(filename)?;
        let tool = find_tool("mysql")?;
        let contents = tokio::fs::read(&path).await?;

        info!("Restoring database from {filename}");
        let mut command = tool_command(&tool);
        command
            .args(self.db.connection_args())
            .arg(&self.db.database)
            .env("MYSQL_PWD", &self.db.password);
        pipe_through(command, "mysql", contents).await
    }

    /// Dumps in the backups directory, newest first.
    ///
    /// # Errors
    /// Returns an error when the directory exists but cannot be read.
    pub async fn list(&self) -> Result<Vec<BackupFile>, BackupError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !has_backup_extension(&filename) {
                continue;
            }
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            backups.push(BackupFile {
                filename,
                size_bytes: metadata.len(),
                modified: metadata.modified().ok().map(to_local),
            });
        }

        backups.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(backups)
    }

    /// # Errors
    /// Returns an error when the file name is invalid or missing, or the file
    /// cannot be removed.
    pub async fn delete(&self, filename: &str) -> Result<(), BackupError> {
        let path = self.existing_file(filename)?;
        tokio::fs::remove_file(&path).await?;
        info!("Deleted backup {filename}");
        Ok(())
    }

    fn existing_file(&self, filename: &str) -> Result<PathBuf, BackupError> {
        validate_filename(filename)?;
        let path = self.dir.join(filename);
        if path.is_file() {
            Ok(path)
        } else {
            Err(BackupError::NotFound(filename.to_string()))
        }
    }
}

/// Run `command` with `input` on stdin, draining stdout and stderr while the
/// input is written. A tool that exits early reports its own stderr rather
/// than the broken pipe left behind.
async fn pipe_through(
    mut command: Command,
    tool: &'static str,
    input: Vec<u8>,
) -> Result<(), BackupError> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let feeder = child.stdin.take().map(|mut stdin| {
        tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        })
    });
    let output = child.wait_with_output().await?;
    let fed = match feeder {
        Some(task) => task.await.map_err(std::io::Error::other)?,
        None => Ok(()),
    };
    trace!("{tool} stdout: {}", String::from_utf8_lossy(&output.stdout));

    if !output.status.success() {
        if let Err(write_error) = &fed {
            debug!("{tool} stopped reading its input: {write_error}");
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!("{tool} failed: stderr='{stderr}'");
        return Err(BackupError::CommandFailed { tool, stderr });
    }
    fed.map_err(BackupError::from)
}

fn find_tool(tool: &'static str) -> Result<PathBuf, BackupError> {
    which(tool).map_err(|_| BackupError::ToolNotFound { tool })
}

fn has_backup_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BACKUP_EXTENSION))
}

fn to_local(time: SystemTime) -> DateTime<Local> {
    DateTime::<Local>::from(time)
}

/// Accept only a plain `.sql` file name, never a path.
fn validate_filename(filename: &str) -> Result<(), BackupError> {
    let is_plain = !filename.is_empty()
        && !filename.contains(['/', '\\'])
        && Path::new(filename).file_name().and_then(|name| name.to_str()) == Some(filename)
        && has_backup_extension(filename);
    if is_plain {
        Ok(())
    } else {
        Err(BackupError::InvalidFilename(filename.to_string()))
    }
}
