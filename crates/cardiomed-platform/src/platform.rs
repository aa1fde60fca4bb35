use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier the data service uses to scope version requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Windows,
    Linux,
    Macos,
    Unknown,
}

impl PlatformId {
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" | "darwin" => Self::Macos,
            _ => Self::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PlatformId;

    #[test]
    fn current_matches_target_os() {
        let expected = if cfg!(target_os = "windows") {
            "windows"
        } else if cfg!(target_os = "linux") {
            "linux"
        } else if cfg!(target_os = "macos") {
            "macos"
        } else {
            "unknown"
        };
        assert_eq!(PlatformId::current().as_str(), expected);
    }

    #[test]
    fn parse_is_case_insensitive_and_falls_back_to_unknown() {
        assert_eq!("Linux".parse::<PlatformId>(), Ok(PlatformId::Linux));
        assert_eq!("darwin".parse::<PlatformId>(), Ok(PlatformId::Macos));
        assert_eq!("freebsd".parse::<PlatformId>(), Ok(PlatformId::Unknown));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for id in [PlatformId::Windows, PlatformId::Linux, PlatformId::Macos] {
            assert_eq!(id.to_string().parse::<PlatformId>(), Ok(id));
        }
    }
}
