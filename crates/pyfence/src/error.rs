//! Errors raised while building an engine.
//!
//! Once built, an engine never returns errors: failures are reported in
//! each [`crate::ExecutionOutcome`].

use pyfence_config::ConfigError;
use pyfence_sandbox::SandboxError;
use thiserror::Error;

/// Failure to construct an [`crate::Engine`].
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The sandbox could not be prepared.
    #[error("failed to prepare sandbox: {0}")]
    Sandbox(#[from] SandboxError),
}
