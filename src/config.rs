//! Configuration for the installer.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (R2D2_REPO_URL, R2D2_BIN_DIR, R2D2_BUILD_TIMEOUT)
//! 2. Config file (`--config`, else $R2D2_INSTALLER_CONFIG, else .r2d2/installer.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .r2d2/installer.yaml
//! - Relative paths in the config file resolve against the project root
//!   (the parent of `.r2d2/`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REPO_URL: &str = "https://github.com/ArturC03/r2d2-cli.git";
pub const DEFAULT_BINARY_NAME: &str = "r2d2";
pub const DEFAULT_CHECKOUT_DIR: &str = "r2d2-cli-install";
pub const DEFAULT_BUILD_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_DENO_INSTALL_URL: &str = "https://deno.land/install.sh";
pub const DEFAULT_DENO_INSTALL_URL_WINDOWS: &str = "https://deno.land/install.ps1";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "R2D2_INSTALLER_CONFIG";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub binary_name: Option<String>,
    #[serde(default)]
    pub checkout_dir_name: Option<String>,
    #[serde(default)]
    pub build_timeout_seconds: Option<u64>,
    /// Overrides the platform default install directory
    #[serde(default)]
    pub bin_dir: Option<String>,
    #[serde(default)]
    pub use_sudo: Option<bool>,
    #[serde(default)]
    pub deno_install_url: Option<String>,
    #[serde(default)]
    pub deno_install_url_windows: Option<String>,
    /// Extra directories searched for tools after PATH
    #[serde(default)]
    pub extra_tool_dirs: Option<Vec<String>>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub repo_url: String,
    pub binary_name: String,
    pub checkout_dir_name: String,
    pub build_timeout: Duration,
    pub bin_dir: Option<PathBuf>,
    pub use_sudo: bool,
    pub deno_install_url: String,
    pub deno_install_url_windows: String,
    pub extra_tool_dirs: Vec<PathBuf>,
    /// Path to config file (if one was loaded)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            repo_url: DEFAULT_REPO_URL.to_string(),
            binary_name: DEFAULT_BINARY_NAME.to_string(),
            checkout_dir_name: DEFAULT_CHECKOUT_DIR.to_string(),
            build_timeout: Duration::from_secs(DEFAULT_BUILD_TIMEOUT_SECONDS),
            bin_dir: None,
            use_sudo: true,
            deno_install_url: DEFAULT_DENO_INSTALL_URL.to_string(),
            deno_install_url_windows: DEFAULT_DENO_INSTALL_URL_WINDOWS.to_string(),
            extra_tool_dirs: default_extra_tool_dirs(),
            config_file: None,
        }
    }
}

fn default_extra_tool_dirs() -> Vec<PathBuf> {
    dirs::home_dir()
        .map(|home| vec![home.join(".deno").join("bin")])
        .unwrap_or_default()
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".r2d2").join("installer.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Expand a leading `~` and resolve relative paths against `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Merge a parsed config file and environment overrides over the defaults.
///
/// `env` looks up a variable by name so callers can substitute the process
/// environment.
pub fn resolve<F>(file: Option<(PathBuf, ConfigFile)>, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ResolvedConfig::default();

    if let Some((path, file)) = file {
        // Base directory is the parent of .r2d2/ when the file lives there
        let base_dir = path
            .parent()
            .map(|p| {
                if p.file_name().is_some_and(|n| n == ".r2d2") {
                    p.parent().unwrap_or(p)
                } else {
                    p
                }
            })
            .unwrap_or(Path::new("."))
            .to_path_buf();

        if let Some(url) = file.repo_url {
            config.repo_url = url;
        }
        if let Some(name) = file.binary_name {
            config.binary_name = name;
        }
        if let Some(dir) = file.checkout_dir_name {
            config.checkout_dir_name = dir;
        }
        if let Some(secs) = file.build_timeout_seconds {
            config.build_timeout = Duration::from_secs(secs);
        }
        if let Some(ref dir) = file.bin_dir {
            config.bin_dir = Some(resolve_path(&base_dir, dir));
        }
        if let Some(sudo) = file.use_sudo {
            config.use_sudo = sudo;
        }
        if let Some(url) = file.deno_install_url {
            config.deno_install_url = url;
        }
        if let Some(url) = file.deno_install_url_windows {
            config.deno_install_url_windows = url;
        }
        if let Some(dirs) = file.extra_tool_dirs {
            config.extra_tool_dirs = dirs.iter().map(|d| resolve_path(&base_dir, d)).collect();
        }
        config.config_file = Some(path);
    }

    if let Some(url) = env("R2D2_REPO_URL") {
        config.repo_url = url;
    }
    if let Some(dir) = env("R2D2_BIN_DIR") {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        config.bin_dir = Some(resolve_path(&cwd, &dir));
    }
    if let Some(secs) = env("R2D2_BUILD_TIMEOUT") {
        let secs: u64 = secs
            .trim()
            .parse()
            .with_context(|| format!("R2D2_BUILD_TIMEOUT must be a number of seconds, got '{}'", secs))?;
        config.build_timeout = Duration::from_secs(secs);
    }

    if config.binary_name.trim().is_empty() {
        anyhow::bail!("binary_name cannot be empty");
    }
    if config.checkout_dir_name.trim().is_empty() {
        anyhow::bail!("checkout_dir_name cannot be empty");
    }
    if config.build_timeout.is_zero() {
        anyhow::bail!("build timeout must be greater than zero");
    }

    Ok(config)
}

/// Load configuration from all sources
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
        .or_else(find_config_file);

    let file = match path {
        Some(path) => {
            let parsed = load_config_file(&path)?;
            Some((path, parsed))
        }
        None => None,
    };

    resolve(file, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, no_env).unwrap();

        assert_eq!(config.repo_url, DEFAULT_REPO_URL);
        assert_eq!(config.binary_name, "r2d2");
        assert_eq!(config.checkout_dir_name, "r2d2-cli-install");
        assert_eq!(config.build_timeout, Duration::from_secs(300));
        assert!(config.use_sudo);
        assert!(config.bin_dir.is_none());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let r2d2_dir = temp.path().join(".r2d2");
        std::fs::create_dir_all(&r2d2_dir).unwrap();

        let config_path = r2d2_dir.join("installer.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
repo_url: https://example.com/fork.git
build_timeout_seconds: 60
bin_dir: ./local-bin
use_sudo: false
extra_tool_dirs:
  - /opt/tools
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        let config = resolve(Some((config_path.clone(), parsed)), no_env).unwrap();

        assert_eq!(config.repo_url, "https://example.com/fork.git");
        assert_eq!(config.build_timeout, Duration::from_secs(60));
        assert_eq!(config.bin_dir, Some(temp.path().join("./local-bin")));
        assert!(!config.use_sudo);
        assert_eq!(config.extra_tool_dirs, vec![PathBuf::from("/opt/tools")]);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            repo_url: Some("https://example.com/from-file.git".to_string()),
            build_timeout_seconds: Some(60),
            ..Default::default()
        };
        let vars: HashMap<&str, &str> = [
            ("R2D2_REPO_URL", "https://example.com/from-env.git"),
            ("R2D2_BUILD_TIMEOUT", "5"),
            ("R2D2_BIN_DIR", "/opt/bin"),
        ]
        .into_iter()
        .collect();

        let config = resolve(Some((PathBuf::from("/etc/r2d2.yaml"), file)), |k| {
            vars.get(k).map(|v| v.to_string())
        })
        .unwrap();

        assert_eq!(config.repo_url, "https://example.com/from-env.git");
        assert_eq!(config.build_timeout, Duration::from_secs(5));
        assert_eq!(config.bin_dir, Some(PathBuf::from("/opt/bin")));
    }

    #[test]
    fn test_rejects_bad_timeout() {
        let result = resolve(None, |k| {
            (k == "R2D2_BUILD_TIMEOUT").then(|| "soon".to_string())
        });
        assert!(result.is_err());

        let file = ConfigFile {
            build_timeout_seconds: Some(0),
            ..Default::default()
        };
        assert!(resolve(Some((PathBuf::from("/x.yaml"), file)), no_env).is_err());
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./bin"),
            PathBuf::from("/home/user/project/./bin")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
