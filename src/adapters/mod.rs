//! Adapter interfaces for the host system.
//!
//! Steps never spawn processes or search PATH directly; they go through
//! [`CommandRunner`] and [`ToolLocator`] so the sequence can be exercised
//! without touching the machine.

pub mod locator;
pub mod process;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use locator::PathLocator;
pub use process::SystemRunner;

/// An external command to run as an opaque subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,

    /// Working directory (inherits the installer's when unset)
    pub cwd: Option<PathBuf>,

    /// Kill the child if the caller stops waiting (used under a timeout)
    pub kill_on_drop: bool,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            kill_on_drop: false,
        }
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn kill_on_drop(mut self) -> Self {
        self.kill_on_drop = true;
        self
    }

    /// Program followed by its arguments, as one line
    pub fn command_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short description of how the process exited, for error messages
    pub fn exit_detail(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };

        match self.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("{}: {}", status, line.trim()),
            None => status,
        }
    }
}

/// Runs external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion. `Err` means it could not be started or
    /// waited on; a non-zero exit is reported through [`CommandOutput`].
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput>;
}

/// Resolves tool names to executables
pub trait ToolLocator: Send + Sync {
    fn locate(&self, tool: &str) -> Option<PathBuf>;

    fn exists(&self, tool: &str) -> bool {
        self.locate(tool).is_some()
    }
}
