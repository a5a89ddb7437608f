//! Core orchestration logic.
//!
//! This module contains:
//! - Orchestrator: the installation state machine and its event loop
//! - Renderer: the read-only view the UI implements

pub mod orchestrator;

// Re-export commonly used types
pub use orchestrator::{
    Control, Orchestrator, Renderer, RunExit, RunReport, Snapshot, UserInput,
};
