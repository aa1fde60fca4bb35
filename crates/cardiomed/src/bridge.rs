use async_trait::async_trait;

use cardiomed_backend::{PlatformBridge, ServiceError};
use cardiomed_platform::PlatformId;

/// Reports the running binary's own version and platform.
#[derive(Debug, Clone)]
pub struct LocalBridge {
    version: String,
    platform: PlatformId,
}

impl LocalBridge {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: PlatformId::current(),
        }
    }

    /// Pretend to be another build, for checking what a given install
    /// would see.
    pub fn with_overrides(mut self, version: Option<String>, platform: Option<PlatformId>) -> Self {
        if let Some(version) = version {
            self.version = version;
        }
        if let Some(platform) = platform {
            self.platform = platform;
        }
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

#[async_trait]
impl PlatformBridge for LocalBridge {
    async fn app_version(&self) -> Result<String, ServiceError> {
        Ok(self.version.clone())
    }

    async fn platform(&self) -> Result<String, ServiceError> {
        Ok(self.platform.as_str().to_string())
    }
}
