use std::path::Path;

use cardiomed_core::DatabaseConfig;
use cardiomed_platform::AppPaths;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_data_endpoint")]
    pub data_endpoint: String,

    #[serde(default)]
    pub data_token: Option<String>,

    #[serde(default)]
    pub update_manifest_url: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub debug_logging: bool,

    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,

    #[serde(default)]
    pub database: DatabaseConfig,
}

fn default_data_endpoint() -> String {
    "http://localhost:8080/rpc".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_max_log_size_bytes() -> u64 {
    5 * 1024 * 1024
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            data_endpoint: default_data_endpoint(),
            data_token: None,
            update_manifest_url: None,
            http_timeout_secs: default_http_timeout(),
            debug_logging: false,
            max_log_size_bytes: default_max_log_size_bytes(),
            database: DatabaseConfig::default(),
        }
    }
}

impl AppSettings {
    /// Read settings, falling back to defaults when the file is missing or
    /// unreadable.
    pub fn load(paths: &AppPaths) -> Self {
        Self::load_from(&paths.settings_file())
    }

    fn load_from(settings_path: &Path) -> Self {
        if !settings_path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(settings_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, paths: &AppPaths) -> Result<(), std::io::Error> {
        paths.ensure_dirs()?;

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.settings_file(), content)?;
        Ok(())
    }

    /// Copy with secrets blanked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.data_token.is_some() {
            copy.data_token = Some("<redacted>".to_string());
        }
        if !copy.database.password.is_empty() {
            copy.database.password = "<redacted>".to_string();
        }
        copy
    }
}
