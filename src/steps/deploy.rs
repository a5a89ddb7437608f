//! Installing the built binary into the bin directory.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use crate::config::DEFAULT_BINARY_NAME;
use crate::domain::{EnvironmentDescriptor, InstallError};

/// Copies the binary to `<bin_dir>/<name>[.exe]` and makes it executable
#[derive(Debug, Clone)]
pub struct Deployer {
    binary_name: String,
}

impl Default for Deployer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployer {
    pub fn new() -> Self {
        Self {
            binary_name: DEFAULT_BINARY_NAME.to_string(),
        }
    }

    pub fn with_binary_name(mut self, name: impl Into<String>) -> Self {
        self.binary_name = name.into();
        self
    }

    /// Final install location for `env`
    pub fn target_path(&self, env: &EnvironmentDescriptor) -> PathBuf {
        env.bin_directory
            .join(env.platform.executable_name(&self.binary_name))
    }

    #[instrument(skip(self, env), fields(binary = %binary.display(), bin_dir = %env.bin_directory.display()))]
    pub async fn deploy(
        &self,
        binary: &Path,
        env: &EnvironmentDescriptor,
    ) -> Result<PathBuf, InstallError> {
        tokio::fs::create_dir_all(&env.bin_directory)
            .await
            .map_err(|e| {
                InstallError::deploy(
                    format!("create bin directory {}", env.bin_directory.display()),
                    e,
                )
            })?;

        let target = self.target_path(env);
        tokio::fs::copy(binary, &target).await.map_err(|e| {
            InstallError::deploy(
                format!("copy {} to {}", binary.display(), target.display()),
                e,
            )
        })?;

        let source_digest = file_digest(binary).await?;
        let target_digest = file_digest(&target).await?;
        if source_digest != target_digest {
            return Err(InstallError::deploy(
                format!("verify {}", target.display()),
                format!(
                    "checksum mismatch (expected {}, found {})",
                    source_digest, target_digest
                ),
            ));
        }
        debug!(sha256 = %target_digest, "Copied binary verified");

        if env.platform.needs_exec_bit() {
            make_executable(&target).await?;
        }

        info!(path = %target.display(), "Binary installed");
        Ok(target)
    }
}

/// SHA-256 of a file, hex encoded
async fn file_digest(path: &Path) -> Result<String, InstallError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| InstallError::deploy(format!("read {}", path.display()), e))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| {
            InstallError::deploy(format!("make {} executable", path.display()), e)
        })
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}
