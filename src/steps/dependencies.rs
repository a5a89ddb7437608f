//! Dependency installation.
//!
//! Dispatch is table-driven: each [`PackageManager`] maps to a fixed,
//! ordered list of commands. Deno is not packaged everywhere, so it gets a
//! separate script-based fallback.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::adapters::{CommandOutput, CommandRunner, CommandSpec, ToolLocator};
use crate::config::{DEFAULT_DENO_INSTALL_URL, DEFAULT_DENO_INSTALL_URL_WINDOWS};
use crate::domain::{EnvironmentDescriptor, InstallError, PackageManager, Platform};

/// Tools that must resolve before the source can be built
pub const REQUIRED_TOOLS: [&str; 3] = ["git", "go", "deno"];

/// Tool installed by the fallback script when the package manager does not
const FALLBACK_TOOL: &str = "deno";

/// Ordered install commands for a package manager
pub fn install_commands(manager: PackageManager, use_sudo: bool) -> Vec<CommandSpec> {
    let privileged = |args: &[&str]| {
        if use_sudo {
            CommandSpec::new("sudo", args.iter().copied())
        } else {
            CommandSpec::new(args[0], args[1..].iter().copied())
        }
    };

    match manager {
        PackageManager::AptGet => vec![
            privileged(&["apt-get", "update"]),
            privileged(&["apt-get", "install", "-y", "git", "golang-go"]),
        ],
        PackageManager::Yum => vec![privileged(&["yum", "install", "-y", "git", "golang"])],
        PackageManager::Pacman => {
            vec![privileged(&["pacman", "-S", "--noconfirm", "git", "go"])]
        }
        PackageManager::Zypper => vec![privileged(&[
            "zypper",
            "--non-interactive",
            "install",
            "git",
            "go",
        ])],
        PackageManager::Brew => vec![CommandSpec::new("brew", ["install", "git", "go", "deno"])],
        PackageManager::Choco => vec![CommandSpec::new("choco", ["install", "-y", "git", "golang"])],
        PackageManager::Unknown => Vec::new(),
    }
}

/// Whether the package manager branch already installs the fallback tool
fn manager_provides_fallback_tool(env: &EnvironmentDescriptor) -> bool {
    env.platform == Platform::MacOs && env.package_manager == PackageManager::Brew
}

/// Ensures `git`, `go` and `deno` are available
#[derive(Clone)]
pub struct DependencyInstaller {
    runner: Arc<dyn CommandRunner>,
    locator: Arc<dyn ToolLocator>,
    use_sudo: bool,
    deno_install_url: String,
    deno_install_url_windows: String,
}

impl DependencyInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, locator: Arc<dyn ToolLocator>) -> Self {
        Self {
            runner,
            locator,
            use_sudo: true,
            deno_install_url: DEFAULT_DENO_INSTALL_URL.to_string(),
            deno_install_url_windows: DEFAULT_DENO_INSTALL_URL_WINDOWS.to_string(),
        }
    }

    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    pub fn with_deno_install_urls(
        mut self,
        unix: impl Into<String>,
        windows: impl Into<String>,
    ) -> Self {
        self.deno_install_url = unix.into();
        self.deno_install_url_windows = windows.into();
        self
    }

    /// Tools from [`REQUIRED_TOOLS`] that do not currently resolve
    pub fn missing_tools(&self) -> Vec<&'static str> {
        REQUIRED_TOOLS
            .into_iter()
            .filter(|tool| !self.locator.exists(tool))
            .collect()
    }

    #[instrument(skip(self, env), fields(package_manager = %env.package_manager))]
    pub async fn ensure(&self, env: &EnvironmentDescriptor) -> Result<(), InstallError> {
        if self.missing_tools().is_empty() {
            info!("All dependencies already installed");
            return Ok(());
        }

        if env.package_manager == PackageManager::Brew && !self.locator.exists("brew") {
            return Err(InstallError::DependencyInstallFailed {
                command: "brew".to_string(),
                exit_detail: "Homebrew is not installed. Please install it first from https://brew.sh/"
                    .to_string(),
            });
        }

        let commands = install_commands(env.package_manager, self.use_sudo);
        if commands.is_empty() {
            warn!(
                package_manager = %env.package_manager,
                "No install commands for this package manager"
            );
        }
        for spec in &commands {
            self.run_checked(spec).await?;
        }

        if !self.locator.exists(FALLBACK_TOOL) && !manager_provides_fallback_tool(env) {
            self.install_deno(env.platform).await?;
        }

        let missing = self.missing_tools();
        if !missing.is_empty() {
            return Err(InstallError::DependencyInstallFailed {
                command: "verify".to_string(),
                exit_detail: format!("still missing after install: {}", missing.join(", ")),
            });
        }

        info!("Dependencies installed");
        Ok(())
    }

    async fn install_deno(&self, platform: Platform) -> Result<(), InstallError> {
        info!(%platform, "Installing Deno with its install script");

        if platform == Platform::Windows {
            let script = format!("irm {} | iex", self.deno_install_url_windows);
            let spec = CommandSpec::new(
                "powershell",
                ["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", script.as_str()],
            );
            self.run_checked(&spec).await?;
            return Ok(());
        }

        let download = CommandSpec::new("curl", ["-fsSL", self.deno_install_url.as_str()]);
        let output = self.run_checked(&download).await?;

        let install = CommandSpec::new("sh", ["-c", output.stdout.as_str()]);
        let label = format!("sh -c <script from {}>", self.deno_install_url);
        self.run_labeled(&install, label).await?;
        Ok(())
    }

    async fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput, InstallError> {
        self.run_labeled(spec, spec.command_line()).await
    }

    async fn run_labeled(
        &self,
        spec: &CommandSpec,
        label: String,
    ) -> Result<CommandOutput, InstallError> {
        info!(command = %label, "Running install command");

        let output = self.runner.run(spec).await.map_err(|e| {
            InstallError::DependencyInstallFailed {
                command: label.clone(),
                exit_detail: format!("failed to start: {}", e),
            }
        })?;

        if !output.success() {
            return Err(InstallError::DependencyInstallFailed {
                command: label,
                exit_detail: output.exit_detail(),
            });
        }

        Ok(output)
    }
}
