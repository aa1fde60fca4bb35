use std::collections::HashMap;
use std::env::consts;

use semver::Version;
use serde::Deserialize;
use thiserror::Error;

/// Longest slice of an error body carried into [`UpdateError::Status`].
const ERROR_EXCERPT_CHARS: usize = 160;

/// `(os, arch, manifest key)` for every build the release pipeline publishes.
const RELEASE_TARGETS: &[(&str, &str, &str)] = &[
    ("linux", "x86_64", "linux-x86_64"),
    ("linux", "aarch64", "linux-aarch64"),
    ("macos", "x86_64", "darwin-x86_64"),
    ("macos", "aarch64", "darwin-aarch64"),
    ("windows", "x86_64", "windows-x86_64"),
];

/// A release newer than the running build, resolved for this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUpdate {
    pub current_version: String,
    pub latest_version: String,
    pub release_notes: Option<String>,
    pub priority: bool,
    pub pub_date: Option<String>,
    pub download_url: Option<String>,
    pub download_size: Option<u64>,
    /// Lowercase hex, present only when the manifest carried a usable digest.
    pub download_sha256: Option<String>,
}

impl AppUpdate {
    /// Installing needs both a payload and a digest to check it against.
    #[must_use]
    pub fn is_installable(&self) -> bool {
        self.download_url.is_some() && self.download_sha256.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformAsset {
    pub url: String,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Static JSON document published next to the release payloads.
///
/// Only `version` is required; a release with no `platforms` entry for this
/// machine is still announced.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateManifest {
    pub version: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub platforms: HashMap<String, PlatformAsset>,
}

impl UpdateManifest {
    /// Compare against the running build and pick the asset for `target`.
    ///
    /// Returns `None` when the manifest is not ahead of `current_version`. An
    /// unknown target still yields an update, just without a payload.
    fn into_update(self, current_version: &str, target: Option<&str>) -> Option<AppUpdate> {
        let latest = bare_version(&self.version);
        let current = bare_version(current_version);
        if !is_newer_version(latest, current) {
            return None;
        }

        let asset = target.and_then(|key| self.platforms.get(key));
        Some(AppUpdate {
            current_version: current.to_owned(),
            latest_version: latest.to_owned(),
            release_notes: self.notes.filter(|notes| !notes.trim().is_empty()),
            priority: self.priority,
            pub_date: self.pub_date,
            download_url: asset.map(|asset| asset.url.clone()),
            download_size: asset.and_then(|asset| asset.size),
            download_sha256: asset
                .and_then(|asset| asset.sha256.as_deref())
                .and_then(normalize_digest),
        })
    }
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("could not reach the update server: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error(
        "update server answered HTTP {status}{}",
        .excerpt.as_deref().map(|text| format!(": {text}")).unwrap_or_default()
    )]
    Status {
        status: reqwest::StatusCode,
        excerpt: Option<String>,
    },
    #[error("update manifest is not valid JSON: {0}")]
    InvalidManifest(#[source] reqwest::Error),
}

/// Manifest key for the running build, e.g. `linux-x86_64`.
#[must_use]
pub fn target_key() -> Option<&'static str> {
    RELEASE_TARGETS
        .iter()
        .find(|(os, arch, _)| *os == consts::OS && *arch == consts::ARCH)
        .map(|(_, _, key)| *key)
}

/// Fetch the update manifest and report a newer version, if any.
///
/// # Errors
/// Returns an error when the server cannot be reached, answers with a
/// non-success status, or serves something other than a manifest.
pub async fn check_for_update(
    client: &reqwest::Client,
    manifest_url: &str,
    current_version: &str,
) -> Result<Option<AppUpdate>, UpdateError> {
    let response = client
        .get(manifest_url)
        .header(reqwest::header::USER_AGENT, "cardiomed")
        .send()
        .await
        .map_err(UpdateError::Unreachable)?;

    let status = response.status();
    if !status.is_success() {
        let excerpt = response.text().await.ok().and_then(|body| {
            let text: String = body.trim().chars().take(ERROR_EXCERPT_CHARS).collect();
            (!text.is_empty()).then_some(text)
        });
        return Err(UpdateError::Status { status, excerpt });
    }

    let manifest = response
        .json::<UpdateManifest>()
        .await
        .map_err(UpdateError::InvalidManifest)?;
    log::debug!(
        "Update manifest lists {} for {} platform(s)",
        manifest.version,
        manifest.platforms.len()
    );
    Ok(manifest.into_update(current_version, target_key()))
}

/// Whether `latest` is a later release than `current`.
///
/// Both sides are read as semver, with `1.2` meaning `1.2.0`. Strings that
/// are not versions at all only compare as newer when they differ.
#[must_use]
pub fn is_newer_version(latest: &str, current: &str) -> bool {
    match (parse_release(latest), parse_release(current)) {
        (Some(latest), Some(current)) => latest > current,
        _ => bare_version(latest) != bare_version(current),
    }
}

fn bare_version(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix(['v', 'V']).unwrap_or(raw)
}

fn parse_release(raw: &str) -> Option<Version> {
    let raw = bare_version(raw);
    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let (core, tail) = raw.split_at(raw.find(['-', '+']).unwrap_or(raw.len()));
    let mut numbers = core
        .split('.')
        .map(|part| part.parse::<u64>().ok().map(|n| n.to_string()))
        .collect::<Option<Vec<_>>>()?;
    if numbers.len() > 3 {
        return None;
    }
    numbers.resize(3, "0".to_owned());
    Version::parse(&format!("{}{tail}", numbers.join("."))).ok()
}

/// Lowercase hex from a bare digest or one tagged `sha256:`.
fn normalize_digest(raw: &str) -> Option<String> {
    const TAG: &str = "sha256:";
    let raw = raw.trim();
    let hex = match raw.get(..TAG.len()) {
        Some(tag) if tag.eq_ignore_ascii_case(TAG) => &raw[TAG.len()..],
        _ if raw.contains(':') => return None,
        _ => raw,
    };
    (hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
        .then(|| hex.to_ascii_lowercase())
}
