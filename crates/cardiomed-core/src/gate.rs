//! Version gate: decides whether the running app must (or should) be updated
//! before the clinic keeps using it.
//!
//! The gate is re-evaluated on every lifecycle trigger; a dismissal only
//! lasts until the next trigger.

use std::fmt;

use log::{debug, error, info, warn};
use thiserror::Error;

use cardiomed_backend::{DataService, PlatformBridge, ServiceError, VersionRequirement};

use crate::version::is_up_to_date;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("failed to read app version: {0}")]
    AppVersion(#[source] ServiceError),
    #[error("failed to read platform identifier: {0}")]
    Platform(#[source] ServiceError),
    #[error("failed to fetch required version for {platform}: {source}")]
    Requirement {
        platform: String,
        #[source]
        source: ServiceError,
    },
}

impl GateError {
    /// A later trigger may succeed, e.g. after the network comes back.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::AppVersion(source)
            | Self::Platform(source)
            | Self::Requirement { source, .. } => source.is_transient(),
        }
    }
}

/// Lifecycle events that cause the gate to look again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateTrigger {
    Startup,
    Login,
    Logout,
    Navigate(String),
}

impl fmt::Display for GateTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => f.write_str("startup"),
            Self::Login => f.write_str("login"),
            Self::Logout => f.write_str("logout"),
            Self::Navigate(page) => write!(f, "navigate to {page}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePrompt {
    pub current_version: String,
    pub required_version: String,
    pub release_notes: Option<String>,
    pub priority: bool,
}

impl UpdatePrompt {
    #[must_use]
    pub fn is_dismissible(&self) -> bool {
        !self.priority
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        if self.priority {
            "Critical Update Required"
        } else {
            "Update Available"
        }
    }

    #[must_use]
    pub fn summary(&self) -> &'static str {
        if self.priority {
            "This update is mandatory and must be installed to continue using the application."
        } else {
            "A new version is available with improvements and bug fixes."
        }
    }
}

/// Compare the running version with a requirement row.
///
/// Returns `None` when there is no requirement, the requirement is blank, or
/// `current` already satisfies it.
#[must_use]
pub fn evaluate(current: &str, requirement: Option<&VersionRequirement>) -> Option<UpdatePrompt> {
    let requirement = requirement.filter(|r| !r.is_blank())?;
    if is_up_to_date(current, &requirement.version) {
        return None;
    }

    Some(UpdatePrompt {
        current_version: current.trim().to_string(),
        required_version: requirement.version.trim().to_string(),
        release_notes: requirement.notes().map(str::to_string),
        priority: requirement.priority,
    })
}

/// Read version and platform from the bridge (concurrently), then look up the
/// requirement for that platform and evaluate it.
///
/// # Errors
/// Returns an error when the bridge or the data service call fails.
pub async fn check_version(
    bridge: &dyn PlatformBridge,
    service: &dyn DataService,
) -> Result<Option<UpdatePrompt>, GateError> {
    let (version, platform) = tokio::join!(bridge.app_version(), bridge.platform());
    let version = version.map_err(GateError::AppVersion)?;
    let platform = platform.map_err(GateError::Platform)?;

    let requirement = service
        .latest_version(&platform)
        .await
        .map_err(|source| GateError::Requirement {
            platform: platform.clone(),
            source,
        })?;

    debug!(
        "Version gate: running {version} on {platform}, requirement {:?}",
        requirement.as_ref().map(|r| r.version.as_str())
    );
    Ok(evaluate(&version, requirement.as_ref()))
}

/// Visible state of the update prompt.
#[derive(Debug, Default)]
pub struct UpdateGate {
    prompt: Option<UpdatePrompt>,
    visible: bool,
}

impl UpdateGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-run the check. Failures are logged and leave the current prompt
    /// untouched; the error is handed back for callers that want to report it.
    ///
    /// # Errors
    /// Returns the [`GateError`] of a failed check.
    pub async fn on_trigger(
        &mut self,
        trigger: &GateTrigger,
        bridge: &dyn PlatformBridge,
        service: &dyn DataService,
    ) -> Result<(), GateError> {
        debug!("Version gate triggered by {trigger}");
        match check_version(bridge, service).await {
            Ok(result) => {
                self.apply(result);
                Ok(())
            }
            Err(error) if error.is_transient() => {
                warn!("Version check failed, retrying on the next trigger: {error}");
                Err(error)
            }
            Err(error) => {
                error!("Version check failed: {error}");
                Err(error)
            }
        }
    }

    /// Replace the prompt with a fresh evaluation result.
    pub fn apply(&mut self, result: Option<UpdatePrompt>) {
        if let Some(prompt) = &result {
            info!(
                "Update required: {} -> {} (priority: {})",
                prompt.current_version, prompt.required_version, prompt.priority
            );
        }
        self.visible = result.is_some();
        self.prompt = result;
    }

    /// Hide the prompt. A priority prompt cannot be dismissed and `false` is
    /// returned.
    pub fn dismiss(&mut self) -> bool {
        match &self.prompt {
            Some(prompt) if prompt.priority => false,
            Some(_) => {
                self.visible = false;
                true
            }
            None => true,
        }
    }

    #[must_use]
    pub fn visible_prompt(&self) -> Option<&UpdatePrompt> {
        self.prompt.as_ref().filter(|_| self.visible)
    }

    #[must_use]
    pub fn blocks_interaction(&self) -> bool {
        self.visible_prompt().is_some_and(|prompt| prompt.priority)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use cardiomed_backend::{Record, RecordId};

    use super::*;

    struct FixedBridge {
        version: &'static str,
        platform: Result<&'static str, ServiceError>,
    }

    #[async_trait]
    impl PlatformBridge for FixedBridge {
        async fn app_version(&self) -> Result<String, ServiceError> {
            Ok(self.version.to_string())
        }

        async fn platform(&self) -> Result<String, ServiceError> {
            self.platform.clone().map(str::to_string)
        }
    }

    fn bridge(version: &'static str) -> FixedBridge {
        FixedBridge {
            version,
            platform: Ok("linux"),
        }
    }

    struct RequirementService {
        rows: Vec<VersionRequirement>,
        fail: bool,
        queried: Mutex<Vec<String>>,
    }

    impl RequirementService {
        fn new(rows: Vec<VersionRequirement>) -> Self {
            Self {
                rows,
                fail: false,
                queried: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(Vec::new())
            }
        }
    }

    #[async_trait]
    impl DataService for RequirementService {
        fn name(&self) -> &'static str {
            "requirements"
        }

        async fn latest_version(
            &self,
            platform: &str,
        ) -> Result<Option<VersionRequirement>, ServiceError> {
            self.queried
                .lock()
                .expect("lock should not be poisoned")
                .push(platform.to_string());
            if self.fail {
                return Err(ServiceError::transport("latest_version_for_platform", "offline"));
            }
            Ok(VersionRequirement::latest_for(&self.rows, platform).cloned())
        }

        async fn list_patients(&self) -> Result<Vec<Record>, ServiceError> {
            Ok(Vec::new())
        }

        async fn get_patient(&self, _id: RecordId) -> Result<Option<Record>, ServiceError> {
            Ok(None)
        }
    }

    fn requirement(version: &str, priority: bool) -> VersionRequirement {
        let mut row = VersionRequirement::new("all", version);
        row.priority = priority;
        row.release_notes = Some("Security fixes".to_string());
        row
    }

    #[test]
    fn evaluate_requires_update_when_behind() {
        let prompt = evaluate("1.2.0", Some(&requirement("1.3.0", false)))
            .expect("older version should prompt");

        assert_eq!(prompt.current_version, "1.2.0");
        assert_eq!(prompt.required_version, "1.3.0");
        assert_eq!(prompt.release_notes.as_deref(), Some("Security fixes"));
        assert!(prompt.is_dismissible());
        assert_eq!(prompt.title(), "Update Available");
    }

    #[test]
    fn evaluate_treats_padded_versions_as_equal() {
        assert!(evaluate("1.2", Some(&requirement("1.2.0", true))).is_none());
        assert!(evaluate("1.2.0", Some(&requirement("1.2", true))).is_none());
    }

    #[test]
    fn oversized_required_component_still_blocks() {
        let prompt = evaluate("1.0.0", Some(&requirement("1.99999999999999999999", true)))
            .expect("an unreachable requirement should still prompt");

        assert_eq!(prompt.required_version, "1.99999999999999999999");
        assert!(!prompt.is_dismissible());
    }

    #[test]
    fn evaluate_without_requirement_shows_nothing() {
        assert!(evaluate("0.0.1", None).is_none());
        assert!(evaluate("0.0.1", Some(&requirement("   ", true))).is_none());
    }

    #[test]
    fn priority_prompt_is_not_dismissible() {
        let prompt = evaluate("1.0.0", Some(&requirement("2.0.0", true))).expect("prompt");
        assert!(!prompt.is_dismissible());
        assert_eq!(prompt.title(), "Critical Update Required");

        let mut gate = UpdateGate::new();
        gate.apply(Some(prompt));

        assert!(gate.blocks_interaction());
        assert!(!gate.dismiss());
        assert!(gate.visible_prompt().is_some());
    }

    #[test]
    fn optional_prompt_can_be_dismissed() {
        let mut gate = UpdateGate::new();
        gate.apply(evaluate("1.0.0", Some(&requirement("1.1.0", false))));

        assert!(!gate.blocks_interaction());
        assert!(gate.dismiss());
        assert!(gate.visible_prompt().is_none());
    }

    #[tokio::test]
    async fn check_version_queries_bridge_platform() {
        let service = RequirementService::new(vec![requirement("0.5.0", false)]);

        let prompt = check_version(&bridge("0.4.9"), &service)
            .await
            .expect("check should succeed")
            .expect("update should be required");

        assert_eq!(prompt.required_version, "0.5.0");
        assert_eq!(
            *service.queried.lock().expect("lock should not be poisoned"),
            vec!["linux".to_string()]
        );
    }

    #[tokio::test]
    async fn check_version_reports_bridge_failure() {
        let service = RequirementService::new(Vec::new());
        let bridge = FixedBridge {
            version: "1.0.0",
            platform: Err(ServiceError::bridge("platform", "not available")),
        };

        let result = check_version(&bridge, &service).await;

        assert!(matches!(result, Err(GateError::Platform(_))));
        assert!(
            service
                .queried
                .lock()
                .expect("lock should not be poisoned")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn dismissed_prompt_returns_on_next_trigger() {
        let service = RequirementService::new(vec![requirement("2.0.0", false)]);
        let bridge = bridge("1.0.0");
        let mut gate = UpdateGate::new();

        gate.on_trigger(&GateTrigger::Startup, &bridge, &service)
            .await
            .expect("startup check should succeed");
        assert!(gate.dismiss());
        assert!(gate.visible_prompt().is_none());

        gate.on_trigger(&GateTrigger::Navigate("patients".to_string()), &bridge, &service)
            .await
            .expect("navigation check should succeed");
        assert!(gate.visible_prompt().is_some());
    }

    #[tokio::test]
    async fn failed_check_keeps_previous_prompt() {
        let mut gate = UpdateGate::new();
        gate.apply(evaluate("1.0.0", Some(&requirement("2.0.0", true))));

        let result = gate
            .on_trigger(&GateTrigger::Login, &bridge("1.0.0"), &RequirementService::failing())
            .await;

        let error = result.expect_err("offline service should fail the check");
        assert!(matches!(error, GateError::Requirement { .. }));
        assert!(error.is_transient());
        assert!(gate.blocks_interaction());
    }

    #[tokio::test]
    async fn up_to_date_check_hides_prompt() {
        let mut gate = UpdateGate::new();
        gate.apply(evaluate("1.0.0", Some(&requirement("2.0.0", false))));

        let service = RequirementService::new(vec![requirement("2.0.0", false)]);
        gate.on_trigger(&GateTrigger::Logout, &bridge("2.0.0"), &service)
            .await
            .expect("logout check should succeed");

        assert!(gate.visible_prompt().is_none());
    }
}
