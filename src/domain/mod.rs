//! Domain types for the installer.
//!
//! This module contains the core data structures:
//! - Environment: platform, package manager and install directory
//! - State: the installation state machine's states and progress
//! - Error: typed step failures
//! - Events: completion messages and the transition log

pub mod environment;
pub mod error;
pub mod events;
pub mod state;

// Re-export commonly used types
pub use environment::{EnvironmentDescriptor, PackageManager, Platform};
pub use error::{ErrorKind, InstallError};
pub use events::{Completion, StepOutput, TaskResult, Ticket, Transition};
pub use state::{InstallationState, StateTag, StepProgress, TOTAL_STEPS};
