//! JSON messages exchanged with the child bootstrap.
//!
//! The parent writes one [`ChildRequest`] line to the child's stdin; the
//! child answers with one [`ChildReport`] line on its stdout. User output
//! never reaches the real stdout because the bootstrap redirects it into
//! bounded buffers first.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::limits::{MAX_REPORTED_VARIABLES, MAX_VARIABLE_REPR, ResourceLimits};
use crate::runtime::RuntimeDescriptor;

/// Request sent to the child bootstrap.
#[derive(Debug, Serialize)]
pub struct ChildRequest<'a> {
    code: &'a str,
    timeout_ms: u64,
    max_output: usize,
    max_variables: usize,
    max_repr: usize,
    #[serde(flatten)]
    runtime: RuntimeDescriptor,
    variables: &'a BTreeMap<String, Value>,
}

impl<'a> ChildRequest<'a> {
    /// Builds a request for one execution.
    #[must_use]
    pub fn new(
        code: &'a str,
        limits: &ResourceLimits,
        runtime: RuntimeDescriptor,
        variables: &'a BTreeMap<String, Value>,
    ) -> Self {
        Self {
            code,
            timeout_ms: u64::try_from(limits.timeout().as_millis()).unwrap_or(u64::MAX),
            max_output: limits.max_output_bytes(),
            max_variables: MAX_REPORTED_VARIABLES,
            max_repr: MAX_VARIABLE_REPR,
            runtime,
            variables,
        }
    }
}

/// How the child run ended, as judged from inside the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildStatus {
    /// The snippet ran to completion.
    Ok,
    /// The snippet raised an exception.
    Error,
    /// The in-process interval timer fired.
    Timeout,
    /// The snippet ran out of memory.
    Memory,
    /// The bootstrap itself failed before running the snippet.
    Internal,
}

/// Whether the snippet ended with an expression whose value was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionType {
    /// The last statement was an expression and was evaluated.
    Expression,
    /// The snippet was run as plain statements.
    #[default]
    Statements,
}

/// Report written by the child bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildReport {
    status: ChildStatus,
    #[serde(default)]
    execution_type: ExecutionType,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    variables: BTreeMap<String, String>,
}

impl ChildReport {
    /// Creates a report, mainly for tests and doubles.
    #[must_use]
    pub const fn new(status: ChildStatus) -> Self {
        Self {
            status,
            execution_type: ExecutionType::Statements,
            result: None,
            stdout: String::new(),
            stderr: String::new(),
            error: None,
            variables: BTreeMap::new(),
        }
    }

    /// Sets the evaluated result.
    #[must_use]
    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self.execution_type = ExecutionType::Expression;
        self
    }

    /// Sets captured stdout.
    #[must_use]
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Sets captured stderr.
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Sets the error summary.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Records a variable snapshot entry.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, repr: impl Into<String>) -> Self {
        self.variables.insert(name.into(), repr.into());
        self
    }

    /// Completion status.
    #[must_use]
    pub const fn status(&self) -> ChildStatus {
        self.status
    }

    /// Whether a final expression was evaluated.
    #[must_use]
    pub const fn execution_type(&self) -> ExecutionType {
        self.execution_type
    }

    /// `repr` of the final expression, if any and not `None`.
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Captured stdout.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Captured stderr.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// `Type: message` summary of the raised exception.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Snapshot of user-created variables.
    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Parses the last non-empty line of the child's stdout.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the line is not a valid report, or a
    /// synthetic EOF error when no line was written.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let line = raw
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default();
        serde_json::from_str(line)
    }
}
