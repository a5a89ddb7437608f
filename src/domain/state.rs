//! Installation state and the progress derived from it.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::environment::EnvironmentDescriptor;
use super::error::InstallError;

/// Number of progress steps shown to the user
pub const TOTAL_STEPS: usize = 6;

/// Payload-free discriminant of [`InstallationState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateTag {
    Idle,
    DetectingEnvironment,
    InstallingDependencies,
    FetchingSource,
    Building,
    Deploying,
    Completed,
    Failed,
}

impl StateTag {
    /// Fixed step index for the progress display. `Failed` has none of its
    /// own; see [`InstallationState::step_index`].
    pub fn step_index(&self) -> usize {
        match self {
            Self::Idle | Self::Failed => 0,
            Self::DetectingEnvironment => 1,
            Self::InstallingDependencies => 2,
            Self::FetchingSource => 3,
            Self::Building => 4,
            Self::Deploying => 5,
            Self::Completed => 6,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting to begin",
            Self::DetectingEnvironment => "Detecting OS...",
            Self::InstallingDependencies => "Installing deps...",
            Self::FetchingSource => "Cloning repo...",
            Self::Building => "Building CLI...",
            Self::Deploying => "Installing...",
            Self::Completed => "Finalizing...",
            Self::Failed => "Installation failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::DetectingEnvironment => "detecting_environment",
            Self::InstallingDependencies => "installing_dependencies",
            Self::FetchingSource => "fetching_source",
            Self::Building => "building",
            Self::Deploying => "deploying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The single live state of an installation run.
///
/// Each variant carries everything the remaining steps need, so outputs of
/// one step are threaded forward by moving them into the next variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum InstallationState {
    Idle,
    DetectingEnvironment,
    InstallingDependencies {
        env: EnvironmentDescriptor,
    },
    FetchingSource {
        env: EnvironmentDescriptor,
    },
    Building {
        env: EnvironmentDescriptor,
        work_dir: PathBuf,
    },
    Deploying {
        env: EnvironmentDescriptor,
        work_dir: PathBuf,
        binary: PathBuf,
    },
    Completed {
        env: EnvironmentDescriptor,
        installed_path: PathBuf,
    },
    Failed {
        failed_at: StateTag,
        env: Option<EnvironmentDescriptor>,
        error: InstallError,
    },
}

impl Default for InstallationState {
    fn default() -> Self {
        Self::Idle
    }
}

impl InstallationState {
    pub fn tag(&self) -> StateTag {
        match self {
            Self::Idle => StateTag::Idle,
            Self::DetectingEnvironment => StateTag::DetectingEnvironment,
            Self::InstallingDependencies { .. } => StateTag::InstallingDependencies,
            Self::FetchingSource { .. } => StateTag::FetchingSource,
            Self::Building { .. } => StateTag::Building,
            Self::Deploying { .. } => StateTag::Deploying,
            Self::Completed { .. } => StateTag::Completed,
            Self::Failed { .. } => StateTag::Failed,
        }
    }

    /// Progress index; a failed run keeps the index of the step that failed
    pub fn step_index(&self) -> usize {
        match self {
            Self::Failed { failed_at, .. } => failed_at.step_index(),
            other => other.tag().step_index(),
        }
    }

    pub fn environment(&self) -> Option<&EnvironmentDescriptor> {
        match self {
            Self::Idle | Self::DetectingEnvironment => None,
            Self::InstallingDependencies { env }
            | Self::FetchingSource { env }
            | Self::Building { env, .. }
            | Self::Deploying { env, .. }
            | Self::Completed { env, .. } => Some(env),
            Self::Failed { env, .. } => env.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&InstallError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn installed_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Completed { installed_path, .. } => Some(installed_path),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.tag().is_terminal()
    }

    pub fn progress(&self) -> StepProgress {
        StepProgress::for_state(self)
    }
}

/// Display-only progress, recomputed from the state on every read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProgress {
    pub current_step_index: usize,
    pub total_steps: usize,
    pub step_label: String,
}

impl StepProgress {
    pub fn for_state(state: &InstallationState) -> Self {
        Self {
            current_step_index: state.step_index(),
            total_steps: TOTAL_STEPS,
            step_label: state.tag().label().to_string(),
        }
    }

    /// Completed fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        self.current_step_index as f64 / self.total_steps as f64
    }
}
