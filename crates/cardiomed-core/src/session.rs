//! User-facing state of one update check/install cycle.

use log::{error, info};
use tokio::sync::mpsc;

use cardiomed_platform::AppPaths;

use crate::auto_update::{self, ApplyResult, AutoUpdateError, UpdateProgress};
use crate::update::{self, AppUpdate, UpdateError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Checking,
    UpToDate,
    Available,
    Downloading {
        downloaded: u64,
        total: u64,
    },
    Extracting,
    Applying,
    RestartRequired,
    ExitForInstaller,
    CheckFailed,
    InstallFailed,
}

pub struct UpdateSession {
    client: reqwest::Client,
    manifest_url: String,
    current_version: String,
    state: SessionState,
    update: Option<AppUpdate>,
    error: Option<&'static str>,
}

impl UpdateSession {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        manifest_url: impl Into<String>,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            manifest_url: manifest_url.into(),
            current_version: current_version.into(),
            state: SessionState::Idle,
            update: None,
            error: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn update(&self) -> Option<&AppUpdate> {
        self.update.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    #[must_use]
    pub fn is_checking(&self) -> bool {
        self.state == SessionState::Checking
    }

    #[must_use]
    pub fn is_downloading(&self) -> bool {
        matches!(
            self.state,
            SessionState::Downloading { .. } | SessionState::Extracting | SessionState::Applying
        )
    }

    /// Whether the available update is flagged mandatory.
    #[must_use]
    pub fn must_install(&self) -> bool {
        self.update.as_ref().is_some_and(|update| update.priority)
    }

    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        match &self.state {
            SessionState::Downloading { downloaded, total } => UpdateProgress::Downloading {
                downloaded: *downloaded,
                total: *total,
            }
            .percent()
            .unwrap_or(0.0),
            SessionState::Extracting
            | SessionState::Applying
            | SessionState::RestartRequired
            | SessionState::ExitForInstaller => 100.0,
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn status_text(&self) -> String {
        match &self.state {
            SessionState::Idle => String::new(),
            SessionState::Checking => "Checking for updates...".to_string(),
            SessionState::UpToDate => "Your app is up to date.".to_string(),
            SessionState::Available => match &self.update {
                Some(update) => format!("Update available: {}", update.latest_version),
                None => "Update available".to_string(),
            },
            SessionState::Downloading { total: 0, .. } => "Downloading update...".to_string(),
            SessionState::Downloading { .. } => {
                format!("Downloading: {:.0}%", self.progress_percent())
            }
            SessionState::Extracting | SessionState::Applying => {
                "Download finished. Installing...".to_string()
            }
            SessionState::RestartRequired => "Update installed. Restarting...".to_string(),
            SessionState::ExitForInstaller => {
                "Installer started. The application will now close.".to_string()
            }
            SessionState::CheckFailed => "Error checking for updates.".to_string(),
            SessionState::InstallFailed => "Error installing update.".to_string(),
        }
    }

    /// Fetch the manifest and record whether an update is available.
    pub async fn check(&mut self) {
        self.begin_check();
        let result =
            update::check_for_update(&self.client, &self.manifest_url, &self.current_version)
                .await;
        self.finish_check(result);
    }

    fn begin_check(&mut self) {
        self.state = SessionState::Checking;
        self.error = None;
    }

    fn finish_check(&mut self, result: Result<Option<AppUpdate>, UpdateError>) {
        match result {
            Ok(Some(update)) => {
                info!("Update available: {}", update.latest_version);
                self.update = Some(update);
                self.state = SessionState::Available;
            }
            Ok(None) => {
                self.update = None;
                self.state = SessionState::UpToDate;
            }
            Err(err) => {
                error!("Failed to check for updates: {err}");
                self.error = Some("Failed to check for updates.");
                self.state = SessionState::CheckFailed;
            }
        }
    }

    /// Download and apply the pending update, calling `observer` after every
    /// progress step. Returns how the process should continue, or `None`
    /// when there was nothing to install or installing failed.
    pub async fn install<F>(&mut self, paths: &AppPaths, mut observer: F) -> Option<ApplyResult>
    where
        F: FnMut(&Self),
    {
        let update = self.update.clone()?;
        if self.is_downloading() {
            return None;
        }

        self.state = SessionState::Downloading {
            downloaded: 0,
            total: update.download_size.unwrap_or(0),
        };
        self.error = None;
        observer(self);

        let (tx, mut rx) = mpsc::channel(32);
        let client = self.client.clone();
        let paths = paths.clone();
        let handle = tokio::spawn(async move {
            auto_update::download_and_apply(&client, &paths, &update, tx).await
        });

        while let Some(progress) = rx.recv().await {
            self.apply_progress(&progress);
            observer(self);
        }

        let result = match handle.await {
            Ok(result) => result,
            Err(join_error) => Err(AutoUpdateError::Aborted(join_error.to_string())),
        };
        let outcome = self.finish_install(result);
        observer(self);
        outcome
    }

    fn apply_progress(&mut self, progress: &UpdateProgress) {
        self.state = match *progress {
            UpdateProgress::Downloading { downloaded, total } => {
                SessionState::Downloading { downloaded, total }
            }
            UpdateProgress::Extracting => SessionState::Extracting,
            UpdateProgress::Applying => SessionState::Applying,
        };
    }

    fn finish_install(
        &mut self,
        result: Result<ApplyResult, AutoUpdateError>,
    ) -> Option<ApplyResult> {
        match result {
            Ok(ApplyResult::RestartRequired) => {
                self.state = SessionState::RestartRequired;
                Some(ApplyResult::RestartRequired)
            }
            Ok(ApplyResult::ExitForInstaller) => {
                self.state = SessionState::ExitForInstaller;
                Some(ApplyResult::ExitForInstaller)
            }
            Err(err) => {
                error!("Failed to install update: {err}");
                self.error = Some("Failed to install update.");
                self.state = SessionState::InstallFailed;
                None
            }
        }
    }
}
