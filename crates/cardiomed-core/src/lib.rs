//! Core logic for the CardioMed desktop client.
//!
//! Nothing in here talks to a window toolkit:
//! - The version gate that compares the running build with the clinic's
//!   published requirement and decides whether to prompt.
//! - Update discovery, download, verification and installation.
//! - Cardiology risk scores.
//! - Database backups and the medical attachment store.

pub mod auto_update;
mod backup;
mod file_store;
mod gate;
mod scores;
mod session;
mod update;
mod version;

/// Database dump management through the MySQL client tools.
pub use backup::{BackupError, BackupFile, BackupInfo, BackupKind, BackupManager, DatabaseConfig};
/// Attachment storage relative to the data directory.
pub use file_store::{FileStoreError, MedicalFileStore, sanitize_filename};
/// Version gate evaluation and prompt state.
pub use gate::{GateError, GateTrigger, UpdateGate, UpdatePrompt, check_version, evaluate};
/// CHA₂DS₂-VASc, HAS-BLED and risk level labels.
pub use scores::{Cha2Ds2VascInputs, HAS_BLED_HIGH_RISK, HasBledInputs, RiskLevel};
/// Check/install state machine behind the updater screen.
pub use session::{SessionState, UpdateSession};
/// Update manifest model and discovery.
pub use update::{
    AppUpdate, PlatformAsset, UpdateError, UpdateManifest, check_for_update, is_newer_version,
    target_key,
};
/// Lenient dotted version comparison.
pub use version::{VersionParseError, VersionTuple, is_up_to_date};
