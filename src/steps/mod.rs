//! The five installation steps.
//!
//! Each step is a plain async operation returning a typed result. The
//! orchestrator runs them one at a time through a shared [`Toolchain`].

pub mod build;
pub mod dependencies;
pub mod deploy;
pub mod fetch;
pub mod probe;

use std::sync::Arc;

use crate::adapters::{CommandRunner, PathLocator, SystemRunner, ToolLocator};
use crate::config::ResolvedConfig;

pub use build::Builder;
pub use dependencies::{install_commands, DependencyInstaller, REQUIRED_TOOLS};
pub use deploy::Deployer;
pub use fetch::SourceFetcher;
pub use probe::EnvironmentProber;

/// All step components, shared read-only with background tasks
#[derive(Clone)]
pub struct Toolchain {
    pub prober: EnvironmentProber,
    pub dependencies: DependencyInstaller,
    pub fetcher: SourceFetcher,
    pub builder: Builder,
    pub deployer: Deployer,
}

impl Toolchain {
    /// Wire every step to the given runner and locator using `config`
    pub fn from_config(
        config: &ResolvedConfig,
        runner: Arc<dyn CommandRunner>,
        locator: Arc<dyn ToolLocator>,
    ) -> Self {
        Self {
            prober: EnvironmentProber::from_host(Arc::clone(&locator))
                .with_bin_dir(config.bin_dir.clone()),
            dependencies: DependencyInstaller::new(Arc::clone(&runner), locator)
                .with_sudo(config.use_sudo)
                .with_deno_install_urls(
                    config.deno_install_url.clone(),
                    config.deno_install_url_windows.clone(),
                ),
            fetcher: SourceFetcher::new(Arc::clone(&runner))
                .with_repo_url(config.repo_url.clone())
                .with_checkout_dir_name(config.checkout_dir_name.clone()),
            builder: Builder::new(runner)
                .with_binary_name(config.binary_name.clone())
                .with_timeout(config.build_timeout),
            deployer: Deployer::new().with_binary_name(config.binary_name.clone()),
        }
    }

    /// Steps backed by the real host
    pub fn for_host(config: &ResolvedConfig) -> Self {
        Self::from_config(
            config,
            Arc::new(SystemRunner::new()),
            Arc::new(PathLocator::with_extra_dirs(config.extra_tool_dirs.clone())),
        )
    }
}
