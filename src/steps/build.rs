//! Compiling the fetched source.
//!
//! Both commands share one deadline; a failure or an expired deadline ends
//! the step immediately.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{info, instrument};

use crate::adapters::{CommandRunner, CommandSpec};
use crate::config::{DEFAULT_BINARY_NAME, DEFAULT_BUILD_TIMEOUT_SECONDS};
use crate::domain::{InstallError, Platform};

/// Builds the CLI binary with the Go toolchain
#[derive(Clone)]
pub struct Builder {
    runner: Arc<dyn CommandRunner>,
    binary_name: String,
    timeout: Duration,
}

impl Builder {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            binary_name: DEFAULT_BINARY_NAME.to_string(),
            timeout: Duration::from_secs(DEFAULT_BUILD_TIMEOUT_SECONDS),
        }
    }

    pub fn with_binary_name(mut self, name: impl Into<String>) -> Self {
        self.binary_name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where the compiled binary lands inside `work_dir`
    pub fn binary_path(&self, work_dir: &Path, platform: Platform) -> PathBuf {
        work_dir.join(platform.executable_name(&self.binary_name))
    }

    /// The dependency-resolution and compile commands, in order
    pub fn commands(&self, work_dir: &Path, binary: &Path) -> [CommandSpec; 2] {
        [
            CommandSpec::new("go", ["mod", "tidy"])
                .in_dir(work_dir)
                .kill_on_drop(),
            CommandSpec::new(
                "go",
                [
                    "build".to_string(),
                    "-o".to_string(),
                    binary.to_string_lossy().into_owned(),
                    ".".to_string(),
                ],
            )
            .in_dir(work_dir)
            .kill_on_drop(),
        ]
    }

    #[instrument(skip(self, work_dir), fields(work_dir = %work_dir.display(), timeout_secs = self.timeout.as_secs()))]
    pub async fn build(&self, work_dir: &Path, platform: Platform) -> Result<PathBuf, InstallError> {
        let deadline = Instant::now() + self.timeout;
        let binary = self.binary_path(work_dir, platform);

        for spec in self.commands(work_dir, &binary) {
            let command = spec.command_line();
            info!(%command, "Running build command");

            let output = timeout_at(deadline, self.runner.run(&spec))
                .await
                .map_err(|_| InstallError::Timeout {
                    command: command.clone(),
                    limit_seconds: self.timeout.as_secs(),
                })?
                .map_err(|e| InstallError::BuildFailed {
                    command: command.clone(),
                    exit_detail: format!("failed to start: {}", e),
                })?;

            if !output.success() {
                return Err(InstallError::BuildFailed {
                    command,
                    exit_detail: output.exit_detail(),
                });
            }
        }

        info!(binary = %binary.display(), "Build finished");
        Ok(binary)
    }
}
