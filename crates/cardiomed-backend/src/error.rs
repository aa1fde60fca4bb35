use std::fmt::Display;

use thiserror::Error;

/// Failures surfaced by a [`crate::DataService`] implementation.
///
/// `operation` fields carry the RPC method name (`list_patients`,
/// `latest_version_for_platform`, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Could not reach the data service for {operation}: {details}")]
    Transport {
        operation: &'static str,
        details: String,
    },

    #[error("Data service answered {operation} with HTTP {status}")]
    Status { operation: &'static str, status: u16 },

    #[error("Unreadable data service reply to {operation}: {details}")]
    BadResponse {
        operation: &'static str,
        details: String,
    },

    #[error("Data service rejected {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    #[error("Malformed {what}: {details}")]
    Malformed { what: &'static str, details: String },

    #[error("Platform bridge failed during {operation}: {details}")]
    Bridge {
        operation: &'static str,
        details: String,
    },

    #[error("{kind}: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Operation not supported by this data service: {operation}")]
    Unsupported { operation: &'static str },
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// The request never produced a complete response.
    pub fn transport(operation: &'static str, details: impl Display) -> Self {
        Self::Transport {
            operation,
            details: details.to_string(),
        }
    }

    /// A response arrived but is not the expected envelope.
    pub fn bad_response(operation: &'static str, details: impl Display) -> Self {
        Self::BadResponse {
            operation,
            details: details.to_string(),
        }
    }

    pub fn malformed(what: &'static str, details: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            details: details.into(),
        }
    }

    pub fn bridge(operation: &'static str, details: impl Into<String>) -> Self {
        Self::Bridge {
            operation,
            details: details.into(),
        }
    }

    /// Whether retrying later could succeed, as opposed to a request the
    /// service will keep refusing.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Io { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
