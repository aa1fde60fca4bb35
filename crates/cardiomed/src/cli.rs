use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use cardiomed_core::{GateTrigger, RiskLevel};
use cardiomed_platform::PlatformId;

#[derive(Debug, Parser)]
#[command(name = "cardiomed")]
#[command(version, about = "CardioMed clinic client")]
pub struct Cli {
    /// Enable debug logging for this run
    #[arg(long, global = true)]
    pub debug: bool,

    /// Keep config, cache and data under this directory instead of the
    /// per-user locations
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Data service endpoint, overriding the settings file
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare this build with the clinic's required version
    Check(CheckArgs),
    /// Check for and install application updates
    #[command(subcommand)]
    Update(UpdateCommand),
    /// Browse patient records
    #[command(subcommand)]
    Patients(PatientsCommand),
    /// List and manage appointments
    #[command(subcommand)]
    Appointments(AppointmentsCommand),
    /// List and publish required versions
    #[command(subcommand)]
    Versions(VersionsCommand),
    /// Compute cardiology risk scores
    #[command(subcommand)]
    Scores(ScoresCommand),
    /// Database dumps
    #[command(subcommand)]
    Backup(BackupCommand),
    /// Medical attachments
    #[command(subcommand)]
    Files(FilesCommand),
    /// Show or reset the settings file
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TriggerArg {
    Startup,
    Login,
    Logout,
    Navigate,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Lifecycle event that prompted the check
    #[arg(long, value_enum, default_value = "startup")]
    pub trigger: TriggerArg,

    /// Page name for `--trigger navigate`
    #[arg(long, default_value = "dashboard")]
    pub page: String,

    /// Check as if running this version
    #[arg(long = "as-version", value_name = "VERSION")]
    pub as_version: Option<String>,

    /// Check as if running on this platform
    #[arg(long = "as-platform", value_name = "PLATFORM")]
    pub as_platform: Option<PlatformId>,

    /// Dismiss the prompt after showing it
    #[arg(long)]
    pub dismiss: bool,
}

impl CheckArgs {
    pub fn gate_trigger(&self) -> GateTrigger {
        match self.trigger {
            TriggerArg::Startup => GateTrigger::Startup,
            TriggerArg::Login => GateTrigger::Login,
            TriggerArg::Logout => GateTrigger::Logout,
            TriggerArg::Navigate => GateTrigger::Navigate(self.page.clone()),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum UpdateCommand {
    /// Look for a newer release
    Check,
    /// Download, verify and install the newest release
    Install {
        /// Do not restart after installing
        #[arg(long)]
        no_restart: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum PatientsCommand {
    /// List all patients
    List,
    /// Search by name, patient code, phone or CNI
    Search { query: String },
    /// Show one patient with their consultations and exams
    Show { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum AppointmentsCommand {
    /// List appointments, optionally for one day
    List {
        /// Day to list (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Change an appointment's status
    SetStatus { id: i64, status: String },
}

#[derive(Debug, Subcommand)]
pub enum VersionsCommand {
    /// List every published requirement, marking the one in force
    List {
        /// Mark the requirement for this platform instead of the running one
        #[arg(long, value_name = "PLATFORM")]
        platform: Option<PlatformId>,
    },
    /// Publish a new minimum version
    Publish {
        /// Platform it applies to (`all`, `windows`, `linux`, `macos`)
        #[arg(long, default_value = "all")]
        platform: String,
        /// Minimum version, dotted numeric
        version: String,
        /// Release notes shown in the prompt
        #[arg(long)]
        notes: Option<String>,
        /// Make the prompt impossible to dismiss
        #[arg(long)]
        priority: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScoresCommand {
    /// CHA₂DS₂-VASc stroke risk in atrial fibrillation
    Cha2ds2vasc {
        #[arg(long)]
        age: u32,
        #[arg(long)]
        female: bool,
        #[arg(long)]
        chf: bool,
        #[arg(long)]
        hypertension: bool,
        #[arg(long)]
        diabetes: bool,
        /// Prior stroke, TIA or thromboembolism
        #[arg(long)]
        stroke: bool,
        #[arg(long)]
        vascular: bool,
    },
    /// HAS-BLED bleeding risk
    HasBled {
        #[arg(long)]
        hypertension: bool,
        #[arg(long)]
        renal: bool,
        #[arg(long)]
        liver: bool,
        #[arg(long)]
        stroke: bool,
        #[arg(long)]
        bleeding: bool,
        #[arg(long)]
        labile_inr: bool,
        /// Older than 65
        #[arg(long)]
        elderly: bool,
        /// Antiplatelets or NSAIDs
        #[arg(long)]
        drugs: bool,
        #[arg(long)]
        alcohol: bool,
    },
    /// Normalise a cardiovascular risk level (`Bas`, `Modéré`, `Élevé`, `Très Élevé`)
    Level {
        level: RiskLevel,
    },
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Dump the database now
    Create {
        /// Record the dump as scheduled rather than manual
        #[arg(long)]
        automatic: bool,
    },
    /// List dumps, newest first
    List,
    /// Load a dump back into the database
    Restore { filename: String },
    /// Remove a dump
    Delete { filename: String },
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// Copy a file into the store
    Save {
        path: PathBuf,
        /// Name to store it under, defaults to the file's own name
        #[arg(long)]
        name: Option<String>,
    },
    /// Copy a stored file out
    Export {
        relative: String,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Open a stored file with the default viewer
    Open { relative: String },
    /// Remove a stored file
    Delete { relative: String },
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print the effective settings with secrets hidden
    Show,
    /// Print the settings file location
    Path,
    /// Write the default settings file if none exists
    Init,
}
