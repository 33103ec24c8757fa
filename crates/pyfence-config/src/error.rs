use camino::Utf8PathBuf;
use thiserror::Error;

/// Semantic problems detected after the configuration layers were merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The interpreter must be named by an absolute path.
    #[error("interpreter path must be absolute, got {path}")]
    InterpreterNotAbsolute {
        /// Offending path.
        path: Utf8PathBuf,
    },

    /// A limit that must be positive was set to zero.
    #[error("{field} must be greater than zero")]
    ZeroLimit {
        /// Name of the configuration field.
        field: &'static str,
    },

    /// The CPU ceiling would fire before the wall-clock timeout.
    #[error("cpu_limit_secs ({cpu_secs}) must cover timeout_ms ({timeout_ms})")]
    CpuBelowTimeout {
        /// Configured CPU ceiling in seconds.
        cpu_secs: u64,
        /// Configured wall-clock timeout in milliseconds.
        timeout_ms: u64,
    },
}
