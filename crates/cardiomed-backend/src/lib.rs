//! Contracts for the collaborators CardioMed talks to: the data service that
//! owns patient, consultation and appointment records, and the platform
//! bridge that reports the running app's version and platform.

mod error;
mod traits;
mod types;

pub use error::ServiceError;
pub use traits::{DataService, PlatformBridge};
pub use types::{
    AppointmentDraft, Credentials, ExamKind, Record, RecordId, VersionRequirement,
    PLATFORM_WILDCARD,
};
