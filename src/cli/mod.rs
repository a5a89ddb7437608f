//! Command-line interface for the installer.
//!
//! Provides commands for running the installation, probing the host
//! environment, and showing the resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crate::adapters::PathLocator;
use crate::config::{load_config, ResolvedConfig};
use crate::core::{Orchestrator, RunExit, UserInput};
use crate::steps::{EnvironmentProber, Toolchain};

pub mod render;

use render::{spawn_input_pump, LineRenderer};

/// r2d2-installer - bootstrap the R2D2 CLI from source
#[derive(Parser, Debug)]
#[command(name = "r2d2-installer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to $R2D2_INSTALLER_CONFIG or .r2d2/installer.yaml)
    #[arg(long, global = true, env = "R2D2_INSTALLER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect, install dependencies, fetch, build and deploy (default)
    Install {
        /// Begin immediately instead of waiting for Enter
        #[arg(short, long)]
        yes: bool,

        /// Print the run report as JSON when the installer exits
        #[arg(long)]
        json: bool,
    },

    /// Detect the environment and print it as JSON
    Probe,

    /// Show resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;

        match self.command.unwrap_or(Commands::Install {
            yes: false,
            json: false,
        }) {
            Commands::Install { yes, json } => install(&config, yes, json).await,
            Commands::Probe => probe(&config).await,
            Commands::Config => show_config(&config),
        }
    }
}

async fn install(config: &ResolvedConfig, yes: bool, json: bool) -> Result<()> {
    let orchestrator = Orchestrator::new(Toolchain::for_host(config));

    let (tx, rx) = mpsc::channel(16);
    if yes {
        tx.send(UserInput::Begin)
            .await
            .context("Failed to queue begin input")?;
    }
    spawn_input_pump(tx);

    let mut renderer = LineRenderer::stdout(config.binary_name.clone());
    let report = orchestrator.run(rx, &mut renderer).await;

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize run report")?;
        println!("{}", out);
    }

    match (report.exit, report.final_state.error()) {
        (RunExit::Finished, Some(error)) => {
            Err(anyhow::Error::new(error.clone()).context("Installation failed"))
        }
        _ => Ok(()),
    }
}

async fn probe(config: &ResolvedConfig) -> Result<()> {
    let locator = Arc::new(PathLocator::with_extra_dirs(config.extra_tool_dirs.clone()));
    let prober = EnvironmentProber::from_host(locator).with_bin_dir(config.bin_dir.clone());

    let env = prober.probe().await?;
    let out = serde_json::to_string_pretty(&env).context("Failed to serialize environment")?;
    println!("{}", out);
    Ok(())
}

fn show_config(config: &ResolvedConfig) -> Result<()> {
    match config.config_file {
        Some(ref path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!("Repository:    {}", config.repo_url);
    println!("Binary name:   {}", config.binary_name);
    println!("Checkout dir:  {}", config.checkout_dir_name);
    println!("Build timeout: {}s", config.build_timeout.as_secs());
    match config.bin_dir {
        Some(ref dir) => println!("Bin dir:       {}", dir.display()),
        None => println!("Bin dir:       (platform default)"),
    }
    println!("Use sudo:      {}", config.use_sudo);
    println!("Deno script:   {}", config.deno_install_url);
    for dir in &config.extra_tool_dirs {
        println!("Tool dir:      {}", dir.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_install() {
        let cli = Cli::try_parse_from(["r2d2-installer"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_install_flags() {
        let cli =
            Cli::try_parse_from(["r2d2-installer", "install", "--yes", "--json", "--config", "x.yaml"])
                .unwrap();
        match cli.command {
            Some(Commands::Install { yes, json }) => {
                assert!(yes);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, Some(PathBuf::from("x.yaml")));
    }
}
