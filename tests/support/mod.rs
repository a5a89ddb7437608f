//! Shared fakes for the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use r2d2_installer::adapters::{CommandOutput, CommandRunner, CommandSpec, ToolLocator};
use r2d2_installer::steps::{
    Builder, DependencyInstaller, Deployer, EnvironmentProber, SourceFetcher, Toolchain,
};

pub const TEST_REPO: &str = "https://example.com/r2d2-cli.git";

/// Tool locator backed by a mutable set, so fake installs can "provide" tools
#[derive(Default)]
pub struct FakeLocator {
    tools: Mutex<HashSet<String>>,
}

impl FakeLocator {
    pub fn with(tools: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            tools: Mutex::new(tools.iter().map(|t| t.to_string()).collect()),
        })
    }

    pub fn add(&self, tool: &str) {
        self.tools.lock().unwrap().insert(tool.to_string());
    }
}

impl ToolLocator for FakeLocator {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        self.tools
            .lock()
            .unwrap()
            .contains(tool)
            .then(|| PathBuf::from("/fake/bin").join(tool))
    }
}

type Effect = Arc<dyn Fn(&CommandSpec) + Send + Sync>;

/// Canned response for commands matching a prefix
#[derive(Clone)]
pub struct Reply {
    output: CommandOutput,
    delay: Duration,
    provides: Vec<String>,
    locator: Option<Arc<FakeLocator>>,
    effect: Option<Effect>,
}

impl Reply {
    pub fn ok() -> Self {
        Self::exit(0)
    }

    pub fn exit(code: i32) -> Self {
        Self {
            output: CommandOutput {
                code: Some(code),
                stdout: String::new(),
                stderr: String::new(),
            },
            delay: Duration::ZERO,
            provides: Vec::new(),
            locator: None,
            effect: None,
        }
    }

    pub fn stdout(mut self, text: &str) -> Self {
        self.output.stdout = text.to_string();
        self
    }

    pub fn stderr(mut self, text: &str) -> Self {
        self.output.stderr = text.to_string();
        self
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make `tools` resolvable once the command has run
    pub fn provides(mut self, locator: &Arc<FakeLocator>, tools: &[&str]) -> Self {
        self.locator = Some(Arc::clone(locator));
        self.provides = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn effect(mut self, f: impl Fn(&CommandSpec) + Send + Sync + 'static) -> Self {
        self.effect = Some(Arc::new(f));
        self
    }
}

/// Command runner that records every call and answers from a script.
/// Commands without a matching rule succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<(String, Reply)>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer commands whose command line starts with `prefix`
    pub fn on(&self, prefix: &str, reply: Reply) {
        self.rules.lock().unwrap().push((prefix.to_string(), reply));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(CommandSpec::command_line)
            .collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        let line = spec.command_line();
        let reply = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(Reply::ok);

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        if let Some(ref effect) = reply.effect {
            effect(spec);
        }
        if let Some(ref locator) = reply.locator {
            for tool in &reply.provides {
                locator.add(tool);
            }
        }
        Ok(reply.output)
    }
}

/// Effect for `git clone <url> <dir>`: creates the checkout with one file
pub fn fake_clone(spec: &CommandSpec) {
    let dir = PathBuf::from(spec.args.last().expect("clone target"));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("main.go"), "package main\n").unwrap();
}

/// Effect for `go build -o <binary> .`: writes a fake binary
pub fn fake_build(spec: &CommandSpec) {
    let pos = spec.args.iter().position(|a| a == "-o").expect("-o flag");
    let binary = PathBuf::from(&spec.args[pos + 1]);
    std::fs::write(binary, b"\x7fELF fake r2d2 binary").unwrap();
}

/// Steps wired to fakes, rooted in `root`, probing as Linux
pub fn toolchain(runner: &Arc<ScriptedRunner>, locator: &Arc<FakeLocator>, root: &Path) -> Toolchain {
    let runner: Arc<dyn CommandRunner> = runner.clone();
    let locator: Arc<dyn ToolLocator> = locator.clone();

    Toolchain {
        prober: EnvironmentProber::new("linux", Arc::clone(&locator), Some(root.join("home")), None)
            .with_bin_dir(Some(root.join("missing-system-bin"))),
        dependencies: DependencyInstaller::new(Arc::clone(&runner), locator),
        fetcher: SourceFetcher::new(Arc::clone(&runner))
            .with_repo_url(TEST_REPO)
            .with_temp_root(root.join("tmp")),
        builder: Builder::new(runner).with_timeout(Duration::from_secs(5)),
        deployer: Deployer::new(),
    }
}

/// Runner scripted for a run where every step succeeds
pub fn happy_runner() -> Arc<ScriptedRunner> {
    let runner = ScriptedRunner::new();
    runner.on("git clone", Reply::ok().effect(fake_clone));
    runner.on("go build", Reply::ok().effect(fake_build));
    runner
}
