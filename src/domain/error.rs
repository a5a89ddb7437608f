//! Step failures.
//!
//! Every step returns an [`InstallError`]. The orchestrator never looks
//! inside it; it only stores it on the `Failed` state for the renderer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a step failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedPlatform,
    DependencyInstallFailed,
    SourceFetchFailed,
    BuildFailed,
    Timeout,
    DeployFailed,
}

impl ErrorKind {
    /// Build timeouts are reported as a kind of build failure
    pub fn is_build_failure(&self) -> bool {
        matches!(self, Self::BuildFailed | Self::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnsupportedPlatform => "unsupported platform",
            Self::DependencyInstallFailed => "dependency install failed",
            Self::SourceFetchFailed => "source fetch failed",
            Self::BuildFailed => "build failed",
            Self::Timeout => "build timed out",
            Self::DeployFailed => "deploy failed",
        };
        f.write_str(name)
    }
}

/// Terminal error of a step, carrying the offending command where there is one
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum InstallError {
    #[error("unsupported operating system: {os}")]
    UnsupportedPlatform { os: String },

    #[error("failed to install dependencies: `{command}` ({exit_detail})")]
    DependencyInstallFailed { command: String, exit_detail: String },

    #[error("failed to clone repository: `{command}` ({exit_detail})")]
    SourceFetchFailed { command: String, exit_detail: String },

    #[error("failed to build: `{command}` ({exit_detail})")]
    BuildFailed { command: String, exit_detail: String },

    #[error("build timed out after {limit_seconds}s while running `{command}`")]
    Timeout { command: String, limit_seconds: u64 },

    #[error("failed to {operation}: {detail}")]
    DeployFailed { operation: String, detail: String },
}

impl InstallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedPlatform { .. } => ErrorKind::UnsupportedPlatform,
            Self::DependencyInstallFailed { .. } => ErrorKind::DependencyInstallFailed,
            Self::SourceFetchFailed { .. } => ErrorKind::SourceFetchFailed,
            Self::BuildFailed { .. } => ErrorKind::BuildFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::DeployFailed { .. } => ErrorKind::DeployFailed,
        }
    }

    /// Human-readable detail, including command and exit detail
    pub fn detail(&self) -> String {
        self.to_string()
    }

    /// The external command that failed, if the failure came from one
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::DependencyInstallFailed { command, .. }
            | Self::SourceFetchFailed { command, .. }
            | Self::BuildFailed { command, .. }
            | Self::Timeout { command, .. } => Some(command),
            Self::UnsupportedPlatform { .. } | Self::DeployFailed { .. } => None,
        }
    }

    pub(crate) fn deploy(operation: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::DeployFailed {
            operation: operation.into(),
            detail: detail.to_string(),
        }
    }
}
