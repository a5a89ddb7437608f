//! Source checkout into a clean working directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::adapters::{CommandRunner, CommandSpec};
use crate::config::{DEFAULT_CHECKOUT_DIR, DEFAULT_REPO_URL};
use crate::domain::InstallError;

/// Clones the project into `<temp>/<checkout_dir_name>`
#[derive(Clone)]
pub struct SourceFetcher {
    runner: Arc<dyn CommandRunner>,
    repo_url: String,
    temp_root: PathBuf,
    checkout_dir_name: String,
}

impl SourceFetcher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            repo_url: DEFAULT_REPO_URL.to_string(),
            temp_root: std::env::temp_dir(),
            checkout_dir_name: DEFAULT_CHECKOUT_DIR.to_string(),
        }
    }

    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = url.into();
        self
    }

    pub fn with_temp_root(mut self, root: impl AsRef<Path>) -> Self {
        self.temp_root = root.as_ref().to_path_buf();
        self
    }

    pub fn with_checkout_dir_name(mut self, name: impl Into<String>) -> Self {
        self.checkout_dir_name = name.into();
        self
    }

    /// Deterministic checkout location
    pub fn work_dir(&self) -> PathBuf {
        self.temp_root.join(&self.checkout_dir_name)
    }

    #[instrument(skip(self), fields(repo = %self.repo_url))]
    pub async fn fetch(&self) -> Result<PathBuf, InstallError> {
        let work_dir = self.work_dir();

        let stale = tokio::fs::try_exists(&work_dir).await.map_err(|e| {
            InstallError::SourceFetchFailed {
                command: format!("stat {}", work_dir.display()),
                exit_detail: e.to_string(),
            }
        })?;
        if stale {
            debug!(dir = %work_dir.display(), "Removing stale checkout");
            tokio::fs::remove_dir_all(&work_dir).await.map_err(|e| {
                InstallError::SourceFetchFailed {
                    command: format!("remove {}", work_dir.display()),
                    exit_detail: e.to_string(),
                }
            })?;
        }

        let spec = CommandSpec::new(
            "git",
            [
                "clone".to_string(),
                self.repo_url.clone(),
                work_dir.to_string_lossy().into_owned(),
            ],
        );

        let output = self.runner.run(&spec).await.map_err(|e| {
            InstallError::SourceFetchFailed {
                command: spec.command_line(),
                exit_detail: format!("failed to start: {}", e),
            }
        })?;

        if !output.success() {
            return Err(InstallError::SourceFetchFailed {
                command: spec.command_line(),
                exit_detail: output.exit_detail(),
            });
        }

        info!(dir = %work_dir.display(), "Repository cloned");
        Ok(work_dir)
    }
}
