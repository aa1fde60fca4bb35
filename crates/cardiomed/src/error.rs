use cardiomed_backend::ServiceError;
use thiserror::Error;

/// Underlying cause attached to an [`AppError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppErrorDetail {
    #[error("{0}")]
    Text(String),
    #[error("{kind}: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
    #[error("{0}")]
    Service(ServiceError),
}

impl From<String> for AppErrorDetail {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for AppErrorDetail {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<std::io::Error> for AppErrorDetail {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<ServiceError> for AppErrorDetail {
    fn from(error: ServiceError) -> Self {
        Self::Service(error)
    }
}

/// Errors from the lower crates only need their message at this layer.
macro_rules! detail_from_message {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for AppErrorDetail {
                fn from(error: $source) -> Self {
                    Self::Text(error.to_string())
                }
            }
        )+
    };
}

detail_from_message!(
    cardiomed_core::GateError,
    cardiomed_core::UpdateError,
    cardiomed_core::auto_update::AutoUpdateError,
    cardiomed_core::BackupError,
    cardiomed_core::FileStoreError,
    cardiomed_core::VersionParseError,
    serde_json::Error,
    reqwest::Error,
);

/// What a command reports when it gives up; printed as `Error: {self}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{setting} is not configured; edit the settings file")]
    NotConfigured { setting: &'static str },
    #[error("Invalid {what}: {details}")]
    InvalidInput {
        what: &'static str,
        details: AppErrorDetail,
    },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("Settings {action} failed: {details}")]
    Settings {
        action: &'static str,
        details: AppErrorDetail,
    },
    #[error("{operation} failed: {details}")]
    Operation {
        operation: &'static str,
        details: AppErrorDetail,
    },
    #[error("Version check failed: {0}")]
    VersionCheck(AppErrorDetail),
    #[error("App update check failed: {0}")]
    UpdateCheck(AppErrorDetail),
    #[error("App update {phase} failed: {details}")]
    Install {
        phase: &'static str,
        details: AppErrorDetail,
    },
}

impl AppError {
    pub fn not_configured(setting: &'static str) -> Self {
        Self::NotConfigured { setting }
    }

    pub fn invalid_input(what: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::InvalidInput {
            what,
            details: details.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn settings_failed(action: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::Settings {
            action,
            details: details.into(),
        }
    }

    pub fn operation_failed(operation: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::Operation {
            operation,
            details: details.into(),
        }
    }

    pub fn version_check_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::VersionCheck(details.into())
    }

    pub fn update_check_failed(details: impl Into<AppErrorDetail>) -> Self {
        Self::UpdateCheck(details.into())
    }

    /// `phase` is one of `download`, `install` or `restart`.
    pub fn auto_update_failed(phase: &'static str, details: impl Into<AppErrorDetail>) -> Self {
        Self::Install {
            phase,
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use cardiomed_backend::ServiceError;

    use super::{AppError, AppErrorDetail};

    #[test]
    fn messages_carry_their_context() {
        let cases = [
            (
                AppError::not_configured("update_manifest_url"),
                "update_manifest_url is not configured; edit the settings file",
            ),
            (
                AppError::invalid_input("date", "expected YYYY-MM-DD"),
                "Invalid date: expected YYYY-MM-DD",
            ),
            (AppError::not_found("Patient", 42), "Patient 42 not found"),
            (
                AppError::settings_failed("save", "read-only file system"),
                "Settings save failed: read-only file system",
            ),
            (
                AppError::operation_failed("Backup", "mysqldump exited 2"),
                "Backup failed: mysqldump exited 2",
            ),
            (
                AppError::version_check_failed("offline"),
                "Version check failed: offline",
            ),
            (
                AppError::update_check_failed("HTTP 503"),
                "App update check failed: HTTP 503",
            ),
            (
                AppError::auto_update_failed("restart", "spawn failed"),
                "App update restart failed: spawn failed",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn service_errors_stay_structured() {
        let error = AppError::operation_failed(
            "List patients",
            ServiceError::Unsupported {
                operation: "list_patients",
            },
        );

        assert!(matches!(
            &error,
            AppError::Operation {
                details: AppErrorDetail::Service(ServiceError::Unsupported { .. }),
                ..
            }
        ));
        assert_eq!(
            error.to_string(),
            "List patients failed: Operation not supported by this data service: list_patients"
        );
    }

    #[test]
    fn io_errors_keep_their_kind() {
        let detail = AppErrorDetail::from(io::Error::new(io::ErrorKind::NotFound, "backup.sql"));

        assert_eq!(
            detail,
            AppErrorDetail::Io {
                kind: io::ErrorKind::NotFound,
                message: "backup.sql".to_owned(),
            }
        );
        assert_eq!(detail.to_string(), "entity not found: backup.sql");
    }

    #[test]
    fn lower_crate_errors_become_text() {
        let parse = serde_json::from_str::<u8>("x").expect_err("x is not a number");
        let detail = AppErrorDetail::from(parse);

        assert!(matches!(detail, AppErrorDetail::Text(ref text) if text.contains("expected")));
    }
}
