//! Test-case results and solution validation reports.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::outcome::{ExecutionOutcome, FailureKind};

/// One input/expected-output pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Value bound as `test_input`.
    pub input: Value,
    /// Text stdout must equal once both sides are trimmed.
    #[serde(alias = "expected_output")]
    pub expected: String,
}

impl TestCase {
    /// Creates a test case.
    pub fn new(input: Value, expected: impl Into<String>) -> Self {
        Self {
            input,
            expected: expected.into(),
        }
    }
}

/// Result of running a snippet against one test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// 1-based position in the validated suite; `1` for a single run.
    pub test_case: usize,
    /// Whether the run succeeded and its trimmed stdout matched.
    pub passed: bool,
    /// The bound input.
    pub input: Value,
    /// The expected output, as supplied.
    pub expected: String,
    /// Trimmed stdout of the run.
    pub actual: String,
    /// Failure detail when the run did not succeed.
    pub error: Option<String>,
    /// Failure category when the run did not succeed.
    pub failure_kind: Option<FailureKind>,
    /// Wall-clock execution time in seconds.
    pub execution_time: f64,
}

impl TestCaseResult {
    /// Compares an outcome with the expected output.
    #[must_use]
    pub fn from_outcome(case: &TestCase, outcome: &ExecutionOutcome) -> Self {
        let actual = outcome.stdout().trim();
        Self {
            test_case: 1,
            passed: outcome.success() && actual == case.expected.trim(),
            input: case.input.clone(),
            expected: case.expected.clone(),
            actual: actual.to_owned(),
            error: outcome.error_detail().map(str::to_owned),
            failure_kind: outcome.failure_kind(),
            execution_time: outcome.execution_time(),
        }
    }

    #[must_use]
    pub(crate) const fn numbered(mut self, index: usize) -> Self {
        self.test_case = index;
        self
    }
}

/// Aggregate of a snippet's results over a suite of test cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of cases run.
    pub total_tests: usize,
    /// Number of cases that passed.
    pub passed_tests: usize,
    /// `passed_tests / total_tests`, or `0.0` for an empty suite.
    pub success_rate: f64,
    /// Whether every case passed; vacuously `true` for an empty suite.
    pub all_passed: bool,
    /// Per-case detail in suite order.
    pub results: Vec<TestCaseResult>,
}

impl ValidationReport {
    /// Aggregates per-case results.
    #[must_use]
    pub fn from_results(results: Vec<TestCaseResult>) -> Self {
        let total_tests = results.len();
        let passed_tests = results.iter().filter(|result| result.passed).count();
        Self {
            total_tests,
            passed_tests,
            success_rate: success_rate(passed_tests, total_tests),
            all_passed: passed_tests == total_tests,
            results,
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "success rate is reported as a fraction"
)]
fn success_rate(passed: usize, total: usize) -> f64 {
    match (u32::try_from(passed), u32::try_from(total)) {
        (Ok(passed), Ok(total)) if total > 0 => f64::from(passed) / f64::from(total),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 0, 0.0)]
    #[case(1, 2, 0.5)]
    #[case(3, 3, 1.0)]
    fn success_rate_is_a_fraction(#[case] passed: usize, #[case] total: usize, #[case] rate: f64) {
        assert!((success_rate(passed, total) - rate).abs() < f64::EPSILON);
    }

    #[test]
    fn test_case_accepts_expected_output_alias() {
        let case: TestCase =
            serde_json::from_str(r#"{"input": 5, "expected_output": "10"}"#).expect("parse case");
        assert_eq!(case, TestCase::new(Value::from(5), "10"));
    }

    #[test]
    fn empty_suite_passes_vacuously() {
        let report = ValidationReport::from_results(Vec::new());
        assert_eq!(report.total_tests, 0);
        assert!(report.all_passed);
    }
}
