//! The single result type returned for every execution.

use std::collections::BTreeMap;
use std::time::Duration;

use pyfence_sandbox::ExecutionType;
use pyfence_vetting::ViolationKind;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Why an execution did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FailureKind {
    /// Static vetting rejected the snippet.
    PolicyViolation,
    /// The snippet was longer than the configured maximum.
    LengthExceeded,
    /// The wall-clock or CPU budget ran out.
    Timeout,
    /// The snippet exhausted its address space.
    MemoryExceeded,
    /// The snippet raised an exception.
    RuntimeError,
    /// The engine could not run the snippet.
    SystemError,
}

/// Normalised result of one execution.
///
/// `success` is `true` exactly when `failure_kind` is `None`; the
/// constructors are the only way to build an outcome, so the two cannot
/// disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    success: bool,
    result_value: Option<String>,
    stdout: String,
    stderr: String,
    execution_time: f64,
    failure_kind: Option<FailureKind>,
    error_detail: Option<String>,
    execution_type: ExecutionType,
    variables: BTreeMap<String, String>,
    violation: Option<ViolationKind>,
}

impl ExecutionOutcome {
    /// A successful run.
    pub(crate) fn succeeded(elapsed: Duration) -> Self {
        Self {
            success: true,
            result_value: None,
            stdout: String::new(),
            stderr: String::new(),
            execution_time: elapsed.as_secs_f64(),
            failure_kind: None,
            error_detail: None,
            execution_type: ExecutionType::Statements,
            variables: BTreeMap::new(),
            violation: None,
        }
    }

    /// A failed run of the given kind.
    pub(crate) fn failed(kind: FailureKind, detail: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            failure_kind: Some(kind),
            error_detail: Some(detail.into()),
            ..Self::succeeded(elapsed)
        }
    }

    pub(crate) fn with_result(mut self, result: Option<String>, execution_type: ExecutionType) -> Self {
        self.result_value = result;
        self.execution_type = execution_type;
        self
    }

    pub(crate) fn with_output(mut self, stdout: String, stderr: String) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    pub(crate) fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub(crate) const fn with_violation(mut self, violation: Option<ViolationKind>) -> Self {
        self.violation = violation;
        self
    }

    /// Whether the snippet ran to completion without raising.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// `repr` of the final expression, when the snippet ended with one.
    #[must_use]
    pub fn result_value(&self) -> Option<&str> {
        self.result_value.as_deref()
    }

    /// Captured stdout, bounded by the output limit.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Captured stderr, bounded by the output limit.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Wall-clock execution time in seconds.
    #[must_use]
    pub const fn execution_time(&self) -> f64 {
        self.execution_time
    }

    /// Failure category, `None` on success.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        self.failure_kind
    }

    /// Short human-readable failure description.
    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    /// Whether a final expression was evaluated.
    #[must_use]
    pub const fn execution_type(&self) -> ExecutionType {
        self.execution_type
    }

    /// Variables left behind by a successful run.
    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// The vetting rule that rejected the snippet, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<ViolationKind> {
        self.violation
    }
}
