//! Installation state machine and its event loop.
//!
//! The orchestrator owns the single live [`InstallationState`]. Entering a
//! working state dispatches exactly one background task; the task reports
//! back with one [`Completion`] on a channel, and only the completion whose
//! ticket matches the in-flight task can move the state forward.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    Completion, EnvironmentDescriptor, InstallError, InstallationState, Platform, StateTag,
    StepOutput, StepProgress, TaskResult, Ticket, Transition,
};
use crate::steps::Toolchain;

/// Events the renderer forwards from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    /// Start the installation (only meaningful while idle)
    Begin,
    /// Stop the event loop, in any state
    Quit,
}

/// What the event loop should do after handling an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Everything a renderer may read after a transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub run_id: Uuid,
    pub tag: StateTag,
    pub progress: StepProgress,
    pub environment: Option<EnvironmentDescriptor>,
    pub error: Option<InstallError>,
    pub installed_path: Option<PathBuf>,
}

/// Draws orchestrator state; called after every transition
pub trait Renderer {
    fn render(&mut self, snapshot: &Snapshot);
}

/// Why the event loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunExit {
    /// The user quit; any outstanding task result is discarded
    Quit,
    /// A terminal state (completed or failed) was reached
    Finished,
}

/// Summary handed back when the event loop exits
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub exit: RunExit,
    pub final_state: InstallationState,
    pub transitions: Vec<Transition>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.final_state, InstallationState::Completed { .. })
    }

    /// States visited, starting from idle
    pub fn visited(&self) -> Vec<StateTag> {
        let mut tags = vec![StateTag::Idle];
        tags.extend(self.transitions.iter().map(|t| t.to));
        tags
    }
}

/// Owned inputs for one step, built from the state that dispatches it
#[derive(Debug)]
enum StepJob {
    Detect,
    InstallDependencies {
        env: EnvironmentDescriptor,
    },
    Fetch,
    Build {
        work_dir: PathBuf,
        platform: Platform,
    },
    Deploy {
        binary: PathBuf,
        env: EnvironmentDescriptor,
    },
}

impl StepJob {
    fn for_state(state: &InstallationState) -> Option<Self> {
        match state {
            InstallationState::DetectingEnvironment => Some(Self::Detect),
            InstallationState::InstallingDependencies { env } => {
                Some(Self::InstallDependencies { env: env.clone() })
            }
            InstallationState::FetchingSource { .. } => Some(Self::Fetch),
            InstallationState::Building { env, work_dir } => Some(Self::Build {
                work_dir: work_dir.clone(),
                platform: env.platform,
            }),
            InstallationState::Deploying { env, binary, .. } => Some(Self::Deploy {
                binary: binary.clone(),
                env: env.clone(),
            }),
            InstallationState::Idle
            | InstallationState::Completed { .. }
            | InstallationState::Failed { .. } => None,
        }
    }

    async fn run(self, steps: &Toolchain) -> TaskResult {
        match self {
            Self::Detect => steps
                .prober
                .probe()
                .await
                .map(|env| StepOutput::EnvironmentDetected { env }),
            Self::InstallDependencies { env } => steps
                .dependencies
                .ensure(&env)
                .await
                .map(|()| StepOutput::DependenciesReady),
            Self::Fetch => steps
                .fetcher
                .fetch()
                .await
                .map(|work_dir| StepOutput::SourceFetched { work_dir }),
            Self::Build { work_dir, platform } => steps
                .builder
                .build(&work_dir, platform)
                .await
                .map(|binary| StepOutput::Built { binary }),
            Self::Deploy { binary, env } => steps
                .deployer
                .deploy(&binary, &env)
                .await
                .map(|installed_path| StepOutput::Deployed { installed_path }),
        }
    }
}

/// Drives the installation sequence one step at a time
pub struct Orchestrator {
    run_id: Uuid,
    toolchain: Arc<Toolchain>,
    state: InstallationState,
    in_flight: Option<Ticket>,
    next_ticket: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    transitions: Vec<Transition>,
}

impl Orchestrator {
    /// Create an idle orchestrator over the given steps
    pub fn new(toolchain: Toolchain) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            run_id: Uuid::new_v4(),
            toolchain: Arc::new(toolchain),
            state: InstallationState::Idle,
            in_flight: None,
            next_ticket: 1,
            completions_tx,
            completions_rx,
            transitions: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> &InstallationState {
        &self.state
    }

    pub fn progress(&self) -> StepProgress {
        self.state.progress()
    }

    /// Ticket of the task currently awaited, if any
    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            run_id: self.run_id,
            tag: self.state.tag(),
            progress: self.progress(),
            environment: self.state.environment().cloned(),
            error: self.state.error().cloned(),
            installed_path: self.state.installed_path().cloned(),
        }
    }

    /// Apply a user input. `Begin` only has an effect while idle.
    pub fn handle_input(&mut self, input: UserInput) -> Control {
        match input {
            UserInput::Quit => {
                info!(run_id = %self.run_id, state = %self.state.tag(), "Quit requested");
                Control::Quit
            }
            UserInput::Begin => {
                if matches!(self.state, InstallationState::Idle) {
                    self.transition(InstallationState::DetectingEnvironment);
                } else {
                    debug!(state = %self.state.tag(), "Ignoring begin outside idle state");
                }
                Control::Continue
            }
        }
    }

    /// Apply a task completion. Returns `false` when the message is stale,
    /// duplicated or does not belong to the current state.
    pub fn apply(&mut self, completion: Completion) -> bool {
        if self.in_flight != Some(completion.ticket) {
            warn!(
                ticket = completion.ticket.id,
                step = %completion.ticket.step,
                awaiting = ?self.in_flight.map(|t| t.id),
                "Ignoring stale completion"
            );
            return false;
        }

        match completion.result {
            Ok(output) => {
                if output.produced_in() != self.state.tag() {
                    warn!(
                        state = %self.state.tag(),
                        produced_in = %output.produced_in(),
                        "Completion output does not match state"
                    );
                    return false;
                }
                let Some(next) = self.advance(output) else {
                    return false;
                };
                self.in_flight = None;
                self.transition(next);
            }
            Err(error) => {
                self.in_flight = None;
                error!(step = %self.state.tag(), %error, "Step failed");
                let failed = InstallationState::Failed {
                    failed_at: self.state.tag(),
                    env: self.state.environment().cloned(),
                    error,
                };
                self.transition(failed);
            }
        }
        true
    }

    /// Wait for the next completion message from a background task
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions_rx.recv().await
    }

    /// Run the event loop until the user quits or a terminal state is reached.
    ///
    /// Inputs take priority over completions so a quit is honoured even while
    /// a result is waiting. When the input channel closes, the loop keeps
    /// draining completions unless it is still idle.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<UserInput>,
        renderer: &mut dyn Renderer,
    ) -> RunReport {
        info!(run_id = %self.run_id, "Installer event loop started");
        renderer.render(&self.snapshot());

        let mut inputs_open = true;
        let exit = loop {
            if self.state.is_terminal() {
                break RunExit::Finished;
            }

            let seen = self.transitions.len();
            tokio::select! {
                biased;

                input = inputs.recv(), if inputs_open => match input {
                    Some(input) => {
                        if self.handle_input(input) == Control::Quit {
                            break RunExit::Quit;
                        }
                    }
                    None => {
                        inputs_open = false;
                        if matches!(self.state, InstallationState::Idle) {
                            break RunExit::Quit;
                        }
                    }
                },

                Some(completion) = self.completions_rx.recv() => {
                    self.apply(completion);
                }

                else => break RunExit::Quit,
            }

            if self.transitions.len() != seen {
                renderer.render(&self.snapshot());
            }
        };

        info!(run_id = %self.run_id, ?exit, state = %self.state.tag(), "Installer event loop stopped");
        RunReport {
            run_id: self.run_id,
            exit,
            final_state: self.state,
            transitions: self.transitions,
        }
    }

    /// Next state for a successful output of the current step
    fn advance(&self, output: StepOutput) -> Option<InstallationState> {
        let next = match (&self.state, output) {
            (InstallationState::DetectingEnvironment, StepOutput::EnvironmentDetected { env }) => {
                InstallationState::InstallingDependencies { env }
            }
            (InstallationState::InstallingDependencies { env }, StepOutput::DependenciesReady) => {
                InstallationState::FetchingSource { env: env.clone() }
            }
            (InstallationState::FetchingSource { env }, StepOutput::SourceFetched { work_dir }) => {
                InstallationState::Building {
                    env: env.clone(),
                    work_dir,
                }
            }
            (InstallationState::Building { env, work_dir }, StepOutput::Built { binary }) => {
                InstallationState::Deploying {
                    env: env.clone(),
                    work_dir: work_dir.clone(),
                    binary,
                }
            }
            (InstallationState::Deploying { env, .. }, StepOutput::Deployed { installed_path }) => {
                InstallationState::Completed {
                    env: env.clone(),
                    installed_path,
                }
            }
            _ => return None,
        };
        Some(next)
    }

    fn transition(&mut self, next: InstallationState) {
        let from = self.state.tag();
        let to = next.tag();
        info!(run_id = %self.run_id, %from, %to, "State transition");

        self.transitions.push(Transition::new(from, to));
        self.state = next;

        if let Some(job) = StepJob::for_state(&self.state) {
            self.dispatch(job);
        }
    }

    fn dispatch(&mut self, job: StepJob) {
        if let Some(outstanding) = self.in_flight {
            // Entering a working state always follows accepting the previous
            // completion, so an outstanding ticket here is a sequencing bug.
            error!(ticket = outstanding.id, "Refusing to dispatch while a task is in flight");
            return;
        }

        let ticket = Ticket {
            id: self.next_ticket,
            step: self.state.tag(),
        };
        self.next_ticket += 1;
        self.in_flight = Some(ticket);

        debug!(ticket = ticket.id, step = %ticket.step, ?job, "Dispatching step");

        let steps = Arc::clone(&self.toolchain);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = job.run(&steps).await;
            if tx.send(Completion { ticket, result }).is_err() {
                debug!(ticket = ticket.id, "Event loop gone, dropping completion");
            }
        });
    }
}
