mod files;
mod gate;
mod maintenance;
mod records;
mod scores;
mod update;

use std::process::ExitCode;
use std::time::Duration;

use cardiomed_platform::AppPaths;
use cardiomed_remote::RemoteDataService;

use crate::cli::Command;
use crate::error::AppError;
use crate::settings::AppSettings;

/// Everything a command needs from the environment.
pub struct Context {
    pub paths: AppPaths,
    pub settings: AppSettings,
    client: reqwest::Client,
    endpoint: String,
}

impl Context {
    pub fn new(
        paths: AppPaths,
        settings: AppSettings,
        endpoint_override: Option<String>,
    ) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(settings.http_timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|error| AppError::operation_failed("HTTP client setup", error))?;
        let endpoint = endpoint_override.unwrap_or_else(|| settings.data_endpoint.clone());

        Ok(Self {
            paths,
            settings,
            client,
            endpoint,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn data_service(&self) -> RemoteDataService {
        RemoteDataService::new(
            self.client.clone(),
            self.endpoint.clone(),
            self.settings.data_token.clone(),
        )
    }

    pub fn manifest_url(&self) -> Result<&str, AppError> {
        self.settings
            .update_manifest_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(AppError::not_configured("update_manifest_url"))
    }
}

pub async fn run(command: Command, ctx: &Context) -> Result<ExitCode, AppError> {
    match command {
        Command::Check(args) => gate::check(ctx, &args).await,
        Command::Update(command) => update::run(ctx, command).await,
        Command::Patients(command) => records::patients(ctx, command).await,
        Command::Appointments(command) => records::appointments(ctx, command).await,
        Command::Versions(command) => records::versions(ctx, command).await,
        Command::Scores(command) => Ok(scores::run(&command)),
        Command::Backup(command) => maintenance::backup(ctx, command).await,
        Command::Files(command) => files::run(ctx, command).await,
        Command::Settings(command) => maintenance::settings(ctx, &command),
    }
}
