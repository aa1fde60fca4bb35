//! Platform plumbing shared by the CardioMed crates: per-OS application
//! directories, the platform identifier reported to the data service, and
//! process spawning helpers.

mod commands;
mod paths;
mod platform;

pub use commands::tool_command;
pub use paths::{AppPaths, AppPathsError};
pub use platform::PlatformId;
