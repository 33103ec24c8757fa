//! Execution requests: the snippet, its inputs and its limits.

use std::collections::BTreeMap;

use pyfence_sandbox::ResourceLimits;
use serde_json::Value;

/// Name the test input is bound to inside the snippet.
pub const TEST_INPUT_NAME: &str = "test_input";

/// Alias of [`TEST_INPUT_NAME`] kept for snippets written against older
/// prompts.
pub const INPUT_DATA_NAME: &str = "input_data";

/// One snippet to vet and run.
///
/// ```
/// use pyfence::ExecutionRequest;
/// use serde_json::json;
///
/// let request = ExecutionRequest::new("print(test_input * 2)")
///     .with_test_input(json!(5))
///     .with_context("factor", json!(3));
/// assert_eq!(request.bindings().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    code: String,
    test_input: Option<Value>,
    context: BTreeMap<String, Value>,
    limits: Option<ResourceLimits>,
}

impl ExecutionRequest {
    /// Creates a request using the engine's default limits.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            test_input: None,
            context: BTreeMap::new(),
            limits: None,
        }
    }

    /// Binds a test input as `test_input` and `input_data`.
    #[must_use]
    pub fn with_test_input(mut self, input: Value) -> Self {
        self.test_input = Some(input);
        self
    }

    /// Binds an extra variable. Names are vetted before execution.
    #[must_use]
    pub fn with_context(mut self, name: impl Into<String>, value: Value) -> Self {
        self.context.insert(name.into(), value);
        self
    }

    /// Overrides the engine's limits for this request.
    #[must_use]
    pub const fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// The snippet source.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The bound test input, if any.
    #[must_use]
    pub const fn test_input(&self) -> Option<&Value> {
        self.test_input.as_ref()
    }

    /// Caller-supplied variables.
    #[must_use]
    pub const fn context(&self) -> &BTreeMap<String, Value> {
        &self.context
    }

    /// Limits overriding the engine defaults.
    #[must_use]
    pub const fn limits(&self) -> Option<&ResourceLimits> {
        self.limits.as_ref()
    }

    /// Every variable bound before the snippet runs.
    #[must_use]
    pub fn bindings(&self) -> BTreeMap<String, Value> {
        let mut bindings = self.context.clone();
        if let Some(input) = &self.test_input {
            bindings.insert(TEST_INPUT_NAME.to_owned(), input.clone());
            bindings.insert(INPUT_DATA_NAME.to_owned(), input.clone());
        }
        bindings
    }
}
