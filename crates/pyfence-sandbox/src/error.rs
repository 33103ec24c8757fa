//! Domain errors raised by the execution supervisor.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while preparing, launching or supervising a child
/// interpreter.
///
/// None of these reach engine callers directly; the engine reports them as
/// a `system-error` outcome and logs the detail.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SandboxError {
    /// The interpreter path was not absolute.
    #[error("the interpreter must be an absolute path, got {0}")]
    ProgramNotAbsolute(Utf8PathBuf),

    /// The interpreter does not exist on the host filesystem.
    #[error("interpreter {path} does not exist on the host filesystem")]
    MissingPath {
        /// Path that was checked.
        path: Utf8PathBuf,
    },

    /// The bootstrap wrapper could not be written.
    #[error("failed to write the bootstrap wrapper: {source}")]
    Bootstrap {
        /// Underlying I/O failure.
        #[source]
        source: Arc<io::Error>,
    },

    /// The supervisor was used after its bootstrap wrapper was removed.
    #[error("the sandbox has been cleaned up")]
    CleanedUp,

    /// The child process could not be spawned.
    #[error("failed to spawn the interpreter: {source}")]
    Spawn {
        /// Underlying I/O failure.
        #[source]
        source: Arc<io::Error>,
    },

    /// A standard stream of the child was not captured.
    #[error("failed to capture child {stream}")]
    StreamUnavailable {
        /// Name of the missing stream.
        stream: &'static str,
    },

    /// Serialising the child request failed.
    #[error("failed to serialise the child request: {message}")]
    Request {
        /// Description of the failure.
        message: String,
    },

    /// Waiting on or signalling the child failed.
    #[error("failed to supervise the child process: {source}")]
    Supervision {
        /// Underlying I/O failure.
        #[source]
        source: Arc<io::Error>,
    },
}

impl SandboxError {
    pub(crate) fn spawn(source: io::Error) -> Self {
        Self::Spawn {
            source: Arc::new(source),
        }
    }

    pub(crate) fn supervision(source: io::Error) -> Self {
        Self::Supervision {
            source: Arc::new(source),
        }
    }

    pub(crate) fn bootstrap(source: io::Error) -> Self {
        Self::Bootstrap {
            source: Arc::new(source),
        }
    }
}
