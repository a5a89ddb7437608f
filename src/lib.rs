//! r2d2-installer - bootstrap installer for the R2D2 CLI
//!
//! Detects the host environment, installs the toolchain the CLI needs,
//! clones the source, builds it and deploys the binary.
//!
//! # Architecture
//!
//! The installer is a small state machine:
//! - One live `InstallationState`, owned by the `Orchestrator`
//! - Each working state dispatches exactly one background step
//! - Steps report back with a single completion message
//! - Any failure is terminal for the run; nothing is retried
//!
//! # Modules
//!
//! - `adapters`: Subprocess and PATH lookup seams
//! - `steps`: Prober, dependency installer, fetcher, builder, deployer
//! - `core`: Orchestrator state machine and event loop
//! - `domain`: Data structures (state, environment, errors, messages)
//! - `config`: Config file and environment overrides
//! - `cli`: Command-line interface and plain-text renderer
//!
//! # Usage
//!
//! ```bash
//! # Interactive install (Enter to begin, q to quit)
//! r2d2-installer
//!
//! # Non-interactive, with a JSON report
//! r2d2-installer install --yes --json
//!
//! # Show what would be detected
//! r2d2-installer probe
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod steps;

// Re-export main types at crate root for convenience
pub use core::{Orchestrator, Renderer, RunExit, RunReport, Snapshot, UserInput};
pub use domain::{
    EnvironmentDescriptor, ErrorKind, InstallError, InstallationState, PackageManager, Platform,
    StateTag, StepProgress,
};
pub use steps::Toolchain;
