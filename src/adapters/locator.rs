//! PATH lookup for required tools.

use std::path::PathBuf;

use tracing::debug;

use super::ToolLocator;

/// Finds tools on `PATH`, then in a list of extra directories.
///
/// The extra directories cover installers that drop binaries outside
/// `PATH` (the Deno script installs into `~/.deno/bin`).
#[derive(Debug, Clone, Default)]
pub struct PathLocator {
    extra_dirs: Vec<PathBuf>,
}

impl PathLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_dirs(extra_dirs: Vec<PathBuf>) -> Self {
        Self { extra_dirs }
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, tool: &str) -> Option<PathBuf> {
        if let Ok(path) = which::which(tool) {
            return Some(path);
        }

        if self.extra_dirs.is_empty() {
            return None;
        }

        let search = std::env::join_paths(&self.extra_dirs).ok()?;
        let cwd = std::env::current_dir().ok()?;
        match which::which_in(tool, Some(search), cwd) {
            Ok(path) => {
                debug!(tool, path = %path.display(), "Found tool outside PATH");
                Some(path)
            }
            Err(_) => None,
        }
    }
}
