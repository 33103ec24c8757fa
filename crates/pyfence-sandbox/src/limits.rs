//! Resource ceilings applied to every child interpreter.

use std::time::Duration;

/// Maximum number of variables reported back from a successful run.
pub const MAX_REPORTED_VARIABLES: usize = 32;

/// Longest `repr` kept for each reported variable, in characters.
pub const MAX_VARIABLE_REPR: usize = 200;

/// Text fields in a report that are capped at the output limit.
const REPORT_TEXT_FIELDS: usize = 4;

/// Worst-case growth of one UTF-8 byte under JSON escaping (`\u00XX`).
const JSON_ESCAPE_FACTOR: usize = 6;

/// Room for keys, status and other fixed report content.
const REPORT_FRAMING_BYTES: usize = 64 * 1024;

/// Open descriptors available to the child. The interpreter needs a handful
/// to import the allowlisted modules.
pub(crate) const CHILD_OPEN_FILES: u64 = 32;

/// Per-execution resource ceilings.
///
/// ```
/// use std::time::Duration;
/// use pyfence_sandbox::ResourceLimits;
///
/// let limits = ResourceLimits::default().with_timeout(Duration::from_secs(3));
/// assert_eq!(limits.timeout(), Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    memory_bytes: u64,
    cpu_secs: u64,
    timeout: Duration,
    grace_period: Duration,
    max_output_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory_bytes: 256 * 1024 * 1024,
            cpu_secs: 6,
            timeout: Duration::from_secs(5),
            grace_period: Duration::from_millis(500),
            max_output_bytes: 16 * 1024,
        }
    }
}

impl ResourceLimits {
    /// Sets the address-space ceiling.
    #[must_use]
    pub const fn with_memory_bytes(mut self, bytes: u64) -> Self {
        self.memory_bytes = bytes;
        self
    }

    /// Sets the CPU-time ceiling.
    #[must_use]
    pub const fn with_cpu_secs(mut self, secs: u64) -> Self {
        self.cpu_secs = secs;
        self
    }

    /// Sets the wall-clock timeout. The CPU ceiling is raised when needed so
    /// that it never fires before the timeout does.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.cpu_secs = self.cpu_secs.max(ceil_secs(timeout).saturating_add(1));
        self
    }

    /// Sets the delay between SIGTERM and SIGKILL.
    #[must_use]
    pub const fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Sets the cap on captured stdout and stderr.
    #[must_use]
    pub const fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Address-space ceiling in bytes.
    #[must_use]
    pub const fn memory_bytes(&self) -> u64 {
        self.memory_bytes
    }

    /// CPU-time ceiling in seconds.
    #[must_use]
    pub const fn cpu_secs(&self) -> u64 {
        self.cpu_secs
    }

    /// Wall-clock timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay between SIGTERM and SIGKILL.
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Cap on captured stdout and stderr, each.
    #[must_use]
    pub const fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    /// Bytes read from the child's report pipe before the rest is discarded.
    ///
    /// The child caps stdout, stderr, the result and the error detail at
    /// `max_output_bytes` UTF-8 bytes each, and each variable `repr` at
    /// [`MAX_VARIABLE_REPR`] characters. JSON escaping grows any byte to at
    /// most `JSON_ESCAPE_FACTOR` bytes.
    pub(crate) const fn report_capacity(&self) -> usize {
        let fields = self
            .max_output_bytes
            .saturating_mul(REPORT_TEXT_FIELDS)
            .saturating_mul(JSON_ESCAPE_FACTOR);
        let variables = MAX_REPORTED_VARIABLES
            .saturating_mul(MAX_VARIABLE_REPR)
            .saturating_mul(2 * 4 * JSON_ESCAPE_FACTOR);
        fields
            .saturating_add(variables)
            .saturating_add(REPORT_FRAMING_BYTES)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    if duration.subsec_nanos() == 0 {
        duration.as_secs()
    } else {
        duration.as_secs().saturating_add(1)
    }
}
