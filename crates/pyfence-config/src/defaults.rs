//! Built-in defaults applied before any configuration layer.

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Interpreter launched for every execution unless overridden.
pub const DEFAULT_INTERPRETER: &str = "/usr/bin/python3";

/// Largest snippet, in characters, accepted for vetting.
pub const DEFAULT_MAX_CODE_LENGTH: usize = 2000;

/// Wall-clock budget for a single execution.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Time allowed between SIGTERM and SIGKILL when a timeout fires.
pub const DEFAULT_GRACE_PERIOD_MS: u64 = 500;

/// Address-space ceiling for the child interpreter.
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 256;

/// CPU-seconds ceiling for the child interpreter.
pub const DEFAULT_CPU_LIMIT_SECS: u64 = 6;

/// Cap applied to captured stdout and stderr.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 16 * 1024;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default interpreter path as an owned value.
pub fn default_interpreter() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_INTERPRETER)
}

/// Default log filter expression used by the binary.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

pub(crate) const fn default_max_code_length() -> usize {
    DEFAULT_MAX_CODE_LENGTH
}

pub(crate) const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

pub(crate) const fn default_grace_period_ms() -> u64 {
    DEFAULT_GRACE_PERIOD_MS
}

pub(crate) const fn default_memory_limit_mb() -> u64 {
    DEFAULT_MEMORY_LIMIT_MB
}

pub(crate) const fn default_cpu_limit_secs() -> u64 {
    DEFAULT_CPU_LIMIT_SECS
}

pub(crate) const fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}
