//! Environment probing.
//!
//! The only place that branches on the host platform. Reads PATH and stats
//! the candidate install directory; nothing is created.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::adapters::{PathLocator, ToolLocator};
use crate::domain::{EnvironmentDescriptor, InstallError, PackageManager, Platform};

/// Default install directory on Unix-like hosts
pub const UNIX_BIN_DIR: &str = "/usr/local/bin";

/// Detects platform, package manager and install directory
#[derive(Clone)]
pub struct EnvironmentProber {
    os: String,
    locator: Arc<dyn ToolLocator>,
    home_dir: Option<PathBuf>,
    user_profile: Option<PathBuf>,
    bin_dir_override: Option<PathBuf>,
}

impl EnvironmentProber {
    /// Create a prober for an explicit OS identifier and host layout
    pub fn new(
        os: impl Into<String>,
        locator: Arc<dyn ToolLocator>,
        home_dir: Option<PathBuf>,
        user_profile: Option<PathBuf>,
    ) -> Self {
        Self {
            os: os.into(),
            locator,
            home_dir,
            user_profile,
            bin_dir_override: None,
        }
    }

    /// Create a prober for the machine we are running on
    pub fn from_host(locator: Arc<dyn ToolLocator>) -> Self {
        Self::new(
            std::env::consts::OS,
            locator,
            dirs::home_dir(),
            std::env::var_os("USERPROFILE").map(PathBuf::from),
        )
    }

    /// Use `dir` instead of the platform default install directory
    pub fn with_bin_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.bin_dir_override = dir;
        self
    }

    #[instrument(skip(self), fields(os = %self.os))]
    pub async fn probe(&self) -> Result<EnvironmentDescriptor, InstallError> {
        let platform =
            Platform::from_os_id(&self.os).ok_or_else(|| InstallError::UnsupportedPlatform {
                os: self.os.clone(),
            })?;

        let (package_manager, default_bin_dir) = match platform {
            Platform::Linux => (self.detect_linux_manager(), PathBuf::from(UNIX_BIN_DIR)),
            Platform::MacOs => (PackageManager::Brew, PathBuf::from(UNIX_BIN_DIR)),
            Platform::Windows => {
                let profile = self.user_profile.clone().unwrap_or_default();
                (PackageManager::Choco, profile.join("bin"))
            }
        };

        let candidate = self.bin_dir_override.clone().unwrap_or(default_bin_dir);
        let bin_directory = if dir_exists(&candidate).await {
            candidate
        } else {
            let fallback = self.home_bin_dir();
            debug!(
                missing = %candidate.display(),
                fallback = %fallback.display(),
                "Install directory missing, using home bin"
            );
            fallback
        };

        let env = EnvironmentDescriptor::new(platform, package_manager, bin_directory);
        info!(
            platform = env.platform_name(),
            package_manager = env.package_manager_name(),
            bin_dir = %env.bin_directory.display(),
            "Environment detected"
        );
        Ok(env)
    }

    fn detect_linux_manager(&self) -> PackageManager {
        PackageManager::LINUX_PRIORITY
            .into_iter()
            .find(|pm| self.locator.exists(pm.name()))
            .unwrap_or(PackageManager::Unknown)
    }

    fn home_bin_dir(&self) -> PathBuf {
        self.home_dir.clone().unwrap_or_default().join("bin")
    }
}

async fn dir_exists(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

impl Default for EnvironmentProber {
    fn default() -> Self {
        Self::from_host(Arc::new(PathLocator::new()))
    }
}
