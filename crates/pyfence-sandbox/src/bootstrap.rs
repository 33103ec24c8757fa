//! The wrapper script that runs inside every child interpreter.
//!
//! The script is written once per supervisor to a uniquely named temporary
//! file and removed exactly once, either by an explicit cleanup or when the
//! supervisor is dropped.

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempPath;
use tracing::debug;

use crate::error::SandboxError;

/// Tracing target for bootstrap file management.
const BOOTSTRAP_TARGET: &str = "pyfence_sandbox::bootstrap";

/// Source of the child-side runtime.
pub const BOOTSTRAP_SOURCE: &str = include_str!("bootstrap.py");

/// Owns the on-disk copy of the bootstrap script.
#[derive(Debug)]
pub struct BootstrapScript {
    path: Option<(Utf8PathBuf, TempPath)>,
}

impl BootstrapScript {
    /// Writes the script to a fresh temporary file.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Bootstrap`] when the file cannot be created or
    /// written, or when the temporary directory is not valid UTF-8.
    pub fn install() -> Result<Self, SandboxError> {
        let mut file = tempfile::Builder::new()
            .prefix("pyfence-bootstrap-")
            .suffix(".py")
            .tempfile()
            .map_err(SandboxError::bootstrap)?;
        file.write_all(BOOTSTRAP_SOURCE.as_bytes())
            .and_then(|()| file.flush())
            .map_err(SandboxError::bootstrap)?;

        let temp_path = file.into_temp_path();
        let path = Utf8PathBuf::from_path_buf(temp_path.to_path_buf()).map_err(|path| {
            SandboxError::bootstrap(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bootstrap path is not UTF-8: {}", path.display()),
            ))
        })?;

        debug!(target: BOOTSTRAP_TARGET, path = %path, "bootstrap script installed");
        Ok(Self {
            path: Some((path, temp_path)),
        })
    }

    /// Location of the script, or `None` once removed.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_ref().map(|(path, _)| path.as_path())
    }

    /// Deletes the script. Later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Bootstrap`] when the file exists but cannot
    /// be removed. The script is forgotten either way.
    pub fn remove(&mut self) -> Result<(), SandboxError> {
        let Some((path, temp_path)) = self.path.take() else {
            return Ok(());
        };
        debug!(target: BOOTSTRAP_TARGET, path = %path, "removing bootstrap script");
        match temp_path.close() {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(SandboxError::bootstrap(error)),
        }
    }
}
