//! Subprocess runner backed by `tokio::process`.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{CommandOutput, CommandRunner, CommandSpec};

/// Runs commands on the host, capturing stdout and stderr
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        debug!(command = %spec, cwd = ?spec.cwd, "Running command");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(spec.kill_on_drop);

        if let Some(ref dir) = spec.cwd {
            command.current_dir(dir);
        }

        let child = command.spawn()?;
        let output = child.wait_with_output().await?;

        debug!(command = %spec, code = ?output.status.code(), "Command finished");

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
