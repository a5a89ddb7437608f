//! Host environment description produced by the prober.
//!
//! Everything downstream of the prober reads the platform through these
//! types instead of looking at the host again.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Operating systems the installer knows how to bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[serde(rename = "macos")]
    MacOs,
    Windows,
}

impl Platform {
    /// Map a Rust OS identifier (`std::env::consts::OS`) to a platform
    pub fn from_os_id(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(Self::Linux),
            "macos" => Some(Self::MacOs),
            "windows" => Some(Self::Windows),
            _ => None,
        }
    }

    /// Display name shown to the user
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::MacOs => "macOS",
            Self::Windows => "Windows",
        }
    }

    /// Suffix appended to executable file names
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }

    /// Whether a deployed binary needs its executable bit set
    pub fn needs_exec_bit(&self) -> bool {
        !matches!(self, Self::Windows)
    }

    /// File name of an executable called `stem` on this platform
    pub fn executable_name(&self, stem: &str) -> String {
        format!("{}{}", stem, self.exe_suffix())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Package managers the dependency installer can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageManager {
    #[serde(rename = "apt-get")]
    AptGet,
    #[serde(rename = "yum")]
    Yum,
    #[serde(rename = "pacman")]
    Pacman,
    #[serde(rename = "zypper")]
    Zypper,
    #[serde(rename = "brew")]
    Brew,
    #[serde(rename = "choco")]
    Choco,
    #[serde(rename = "unknown")]
    Unknown,
}

impl PackageManager {
    /// Linux managers in probe priority order (first match wins)
    pub const LINUX_PRIORITY: [PackageManager; 4] =
        [Self::AptGet, Self::Yum, Self::Pacman, Self::Zypper];

    /// Name of the manager, which is also the binary probed for on PATH
    pub fn name(&self) -> &'static str {
        match self {
            Self::AptGet => "apt-get",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
            Self::Brew => "brew",
            Self::Choco => "choco",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable record of platform, package manager and install directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDescriptor {
    pub platform: Platform,
    pub package_manager: PackageManager,
    pub bin_directory: PathBuf,
}

impl EnvironmentDescriptor {
    pub fn new(platform: Platform, package_manager: PackageManager, bin_directory: PathBuf) -> Self {
        Self {
            platform,
            package_manager,
            bin_directory,
        }
    }

    pub fn platform_name(&self) -> &'static str {
        self.platform.name()
    }

    pub fn package_manager_name(&self) -> &'static str {
        self.package_manager.name()
    }
}
