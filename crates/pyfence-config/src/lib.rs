//! Layered configuration for the pyfence execution engine.
//!
//! Values are resolved with `ortho_config` in increasing precedence: built-in
//! defaults, a TOML file (`--config-path` or `PYFENCE_CONFIG_PATH`),
//! `PYFENCE_*` environment variables, then command-line flags. The engine
//! itself never reads configuration; callers load a [`Config`], check it with
//! [`Config::validate`], and hand it over.

mod defaults;
mod error;
mod logging;

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CPU_LIMIT_SECS, DEFAULT_GRACE_PERIOD_MS, DEFAULT_INTERPRETER, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_CODE_LENGTH, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_MEMORY_LIMIT_MB,
    DEFAULT_TIMEOUT_MS, default_interpreter, default_log_filter, default_log_filter_string,
    default_log_format,
};
pub use error::ConfigError;
pub use logging::{LogFormat, LogFormatParseError};

/// Re-exported so callers can match on loader failures without a direct
/// dependency on `ortho_config`.
pub use ortho_config::OrthoError;

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Settings shared by the engine and the `pyfence` binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "PYFENCE",
    discovery(
        app_name = "pyfence",
        env_var = "PYFENCE_CONFIG_PATH",
        config_file_name = "pyfence.toml",
        dotfile_name = ".pyfence.toml",
        config_cli_long = "config-path"
    )
)]
pub struct Config {
    /// Absolute path of the interpreter spawned for each execution.
    #[serde(default = "defaults::default_interpreter")]
    #[ortho_config(default = defaults::default_interpreter())]
    pub interpreter: Utf8PathBuf,
    /// Longest snippet, in characters, accepted for vetting.
    #[serde(default = "defaults::default_max_code_length")]
    #[ortho_config(default = defaults::DEFAULT_MAX_CODE_LENGTH)]
    pub max_code_length: usize,
    /// Wall-clock timeout in milliseconds.
    #[serde(default = "defaults::default_timeout_ms")]
    #[ortho_config(default = defaults::DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,
    /// Delay between SIGTERM and SIGKILL once the timeout fires.
    #[serde(default = "defaults::default_grace_period_ms")]
    #[ortho_config(default = defaults::DEFAULT_GRACE_PERIOD_MS)]
    pub grace_period_ms: u64,
    /// Address-space ceiling in mebibytes.
    #[serde(default = "defaults::default_memory_limit_mb")]
    #[ortho_config(default = defaults::DEFAULT_MEMORY_LIMIT_MB)]
    pub memory_limit_mb: u64,
    /// CPU-time ceiling in seconds.
    #[serde(default = "defaults::default_cpu_limit_secs")]
    #[ortho_config(default = defaults::DEFAULT_CPU_LIMIT_SECS)]
    pub cpu_limit_secs: u64,
    /// Cap on captured stdout and stderr, each, in bytes.
    #[serde(default = "defaults::default_max_output_bytes")]
    #[ortho_config(default = defaults::DEFAULT_MAX_OUTPUT_BYTES)]
    pub max_output_bytes: usize,
    /// `tracing` filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Encoding used for log events.
    #[serde(default = "defaults::default_log_format")]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            max_code_length: DEFAULT_MAX_CODE_LENGTH,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
            cpu_limit_secs: DEFAULT_CPU_LIMIT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Wall-clock timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// SIGTERM to SIGKILL grace period as a [`Duration`].
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Address-space ceiling in bytes, saturating on overflow.
    #[must_use]
    pub const fn memory_limit_bytes(&self) -> u64 {
        self.memory_limit_mb.saturating_mul(BYTES_PER_MEGABYTE)
    }

    /// Checks the merged values for combinations the engine cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the interpreter path is relative, when a
    /// limit is zero, or when the CPU ceiling is shorter than the timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.interpreter.is_absolute() {
            return Err(ConfigError::InterpreterNotAbsolute {
                path: self.interpreter.clone(),
            });
        }

        let positive = [
            ("max_code_length", self.max_code_length != 0),
            ("timeout_ms", self.timeout_ms != 0),
            ("memory_limit_mb", self.memory_limit_mb != 0),
            ("cpu_limit_secs", self.cpu_limit_secs != 0),
            ("max_output_bytes", self.max_output_bytes != 0),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, ok)| !*ok) {
            return Err(ConfigError::ZeroLimit { field: *field });
        }

        if self.cpu_limit_secs.saturating_mul(1000) < self.timeout_ms {
            return Err(ConfigError::CpuBelowTimeout {
                cpu_secs: self.cpu_limit_secs,
                timeout_ms: self.timeout_ms,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
