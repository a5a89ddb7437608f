//! Messages exchanged between background steps and the orchestrator.
//!
//! Completions are immutable values sent once over a channel; transitions
//! are the in-memory record of how a run moved through its states.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::environment::EnvironmentDescriptor;
use super::error::InstallError;
use super::state::StateTag;

/// Typed success payload of each step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "step")]
pub enum StepOutput {
    EnvironmentDetected { env: EnvironmentDescriptor },
    DependenciesReady,
    SourceFetched { work_dir: PathBuf },
    Built { binary: PathBuf },
    Deployed { installed_path: PathBuf },
}

impl StepOutput {
    /// The state in which this output is the expected result
    pub fn produced_in(&self) -> StateTag {
        match self {
            Self::EnvironmentDetected { .. } => StateTag::DetectingEnvironment,
            Self::DependenciesReady => StateTag::InstallingDependencies,
            Self::SourceFetched { .. } => StateTag::FetchingSource,
            Self::Built { .. } => StateTag::Building,
            Self::Deployed { .. } => StateTag::Deploying,
        }
    }
}

/// Outcome of one dispatched step
pub type TaskResult = Result<StepOutput, InstallError>;

/// Identifies one dispatched task; completions with any other ticket are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub id: u64,
    pub step: StateTag,
}

/// Message a background step sends back exactly once
#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: TaskResult,
}

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub at: DateTime<Utc>,
    pub from: StateTag,
    pub to: StateTag,
}

impl Transition {
    pub fn new(from: StateTag, to: StateTag) -> Self {
        Self {
            at: Utc::now(),
            from,
            to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs_map_to_producing_state() {
        assert_eq!(
            StepOutput::DependenciesReady.produced_in(),
            StateTag::InstallingDependencies
        );
        assert_eq!(
            StepOutput::Built {
                binary: PathBuf::from("/tmp/r2d2")
            }
            .produced_in(),
            StateTag::Building
        );
    }
}
