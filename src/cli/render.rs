//! Plain-text renderer and keyboard input for the installer.

use std::io::{self, BufRead, Write};

use tokio::sync::mpsc;
use tracing::debug;

use crate::core::{Renderer, Snapshot, UserInput};
use crate::domain::StateTag;

const BAR_WIDTH: usize = 30;

/// Prints one block of text per transition
pub struct LineRenderer<W: Write> {
    out: W,
    binary_name: String,
    environment_shown: bool,
}

impl LineRenderer<io::Stdout> {
    pub fn stdout(binary_name: impl Into<String>) -> Self {
        Self::new(io::stdout(), binary_name)
    }
}

impl<W: Write> LineRenderer<W> {
    pub fn new(out: W, binary_name: impl Into<String>) -> Self {
        Self {
            out,
            binary_name: binary_name.into(),
            environment_shown: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        match snapshot.tag {
            StateTag::Idle => {
                writeln!(self.out, "R2D2 CLI Installer")?;
                writeln!(self.out, "Welcome! This installer will:")?;
                writeln!(self.out, "  • Detect your OS and package manager")?;
                writeln!(self.out, "  • Install dependencies (Git, Go, Deno)")?;
                writeln!(self.out, "  • Build and install R2D2 CLI")?;
                writeln!(self.out, "Press Enter to begin or 'q' to quit")?;
            }
            StateTag::Completed => {
                writeln!(self.out, "{}", progress_bar(snapshot))?;
                writeln!(self.out, "🎉 Installation complete!")?;
                if let Some(ref path) = snapshot.installed_path {
                    writeln!(self.out, "Installed to: {}", path.display())?;
                }
                writeln!(self.out, "Try: {} --help", self.binary_name)?;
            }
            StateTag::Failed => {
                writeln!(self.out, "❌ Installation failed!")?;
                if let Some(ref error) = snapshot.error {
                    writeln!(self.out, "Error: {}", error)?;
                }
            }
            _ => {
                writeln!(
                    self.out,
                    "{} [{}/{}] {}",
                    progress_bar(snapshot),
                    snapshot.progress.current_step_index,
                    snapshot.progress.total_steps,
                    snapshot.progress.step_label
                )?;
                if let Some(ref env) = snapshot.environment {
                    if !self.environment_shown {
                        writeln!(
                            self.out,
                            "OS: {} ({})",
                            env.platform_name(),
                            env.package_manager_name()
                        )?;
                        self.environment_shown = true;
                    }
                }
            }
        }
        self.out.flush()
    }
}

impl<W: Write> Renderer for LineRenderer<W> {
    fn render(&mut self, snapshot: &Snapshot) {
        if let Err(e) = self.write_snapshot(snapshot) {
            debug!(error = %e, "Failed to write installer output");
        }
    }
}

fn progress_bar(snapshot: &Snapshot) -> String {
    let filled = (snapshot.progress.fraction() * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Map one line typed by the user to an input
pub fn parse_input(line: &str) -> Option<UserInput> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Some(UserInput::Begin),
        "q" | "quit" | "exit" => Some(UserInput::Quit),
        _ => None,
    }
}

/// Send one input per recognised line until EOF or the receiver is gone.
///
/// Blocking; call from a plain thread, not from the runtime.
pub fn forward_lines<R: BufRead>(reader: R, tx: &mpsc::Sender<UserInput>) {
    for line in reader.lines() {
        let Ok(line) = line else { break };
        if let Some(input) = parse_input(&line) {
            if tx.blocking_send(input).is_err() {
                break;
            }
        }
    }
}

/// Forward stdin lines and Ctrl-C as inputs.
///
/// Stdin is read on a dedicated thread so a pending read never holds up
/// shutdown of the runtime. The stdin thread owns the only strong sender,
/// so EOF on stdin closes the input channel.
pub fn spawn_input_pump(tx: mpsc::Sender<UserInput>) {
    let signal_tx = tx.downgrade();
    std::thread::spawn(move || {
        forward_lines(io::stdin().lock(), &tx);
        debug!("Stdin closed");
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if let Some(tx) = signal_tx.upgrade() {
                let _ = tx.send(UserInput::Quit).await;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EnvironmentDescriptor, InstallError, InstallationState, PackageManager, Platform,
    };
    use std::path::PathBuf;
    use uuid::Uuid;

    fn snapshot(state: InstallationState) -> Snapshot {
        Snapshot {
            run_id: Uuid::new_v4(),
            tag: state.tag(),
            progress: state.progress(),
            environment: state.environment().cloned(),
            error: state.error().cloned(),
            installed_path: state.installed_path().cloned(),
        }
    }

    fn env() -> EnvironmentDescriptor {
        EnvironmentDescriptor::new(
            Platform::Linux,
            PackageManager::Pacman,
            PathBuf::from("/home/tester/bin"),
        )
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input(""), Some(UserInput::Begin));
        assert_eq!(parse_input("  Q "), Some(UserInput::Quit));
        assert_eq!(parse_input("maybe"), None);
    }

    #[test]
    fn test_forward_lines_closes_channel_at_eof() {
        let (tx, mut rx) = mpsc::channel(8);
        let input = io::Cursor::new("maybe\n\nq\n");

        forward_lines(input, &tx);
        drop(tx);

        assert_eq!(rx.blocking_recv(), Some(UserInput::Begin));
        assert_eq!(rx.blocking_recv(), Some(UserInput::Quit));
        assert_eq!(rx.blocking_recv(), None);
    }

    #[test]
    fn test_signal_sender_does_not_keep_channel_open() {
        let (tx, mut rx) = mpsc::channel::<UserInput>(1);
        let weak = tx.downgrade();

        forward_lines(io::Cursor::new(""), &tx);
        drop(tx);

        assert!(weak.upgrade().is_none());
        assert_eq!(rx.blocking_recv(), None);
    }

    #[test]
    fn test_progress_lines_show_environment_once() {
        let mut renderer = LineRenderer::new(Vec::new(), "r2d2");
        renderer.render(&snapshot(InstallationState::FetchingSource { env: env() }));
        renderer.render(&snapshot(InstallationState::Building {
            env: env(),
            work_dir: PathBuf::from("/tmp/w"),
        }));

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("[3/6] Cloning repo..."));
        assert!(text.contains("[4/6] Building CLI..."));
        assert_eq!(text.matches("OS: Linux (pacman)").count(), 1);
    }

    #[test]
    fn test_failure_shows_error_detail() {
        let mut renderer = LineRenderer::new(Vec::new(), "r2d2");
        renderer.render(&snapshot(InstallationState::Failed {
            failed_at: StateTag::FetchingSource,
            env: Some(env()),
            error: InstallError::SourceFetchFailed {
                command: "git clone https://example.com/x.git /tmp/x".to_string(),
                exit_detail: "exit code 128".to_string(),
            },
        }));

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("Installation failed"));
        assert!(text.contains("git clone https://example.com/x.git /tmp/x"));
        assert!(text.contains("exit code 128"));
    }

    #[test]
    fn test_completion_shows_installed_path() {
        let mut renderer = LineRenderer::new(Vec::new(), "r2d2");
        renderer.render(&snapshot(InstallationState::Completed {
            env: env(),
            installed_path: PathBuf::from("/home/tester/bin/r2d2"),
        }));

        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains(&format!("[{}]", "#".repeat(BAR_WIDTH))));
        assert!(text.contains("Installed to: /home/tester/bin/r2d2"));
        assert!(text.contains("Try: r2d2 --help"));
    }
}
