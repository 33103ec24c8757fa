//! Engine behaviour against a supervisor double.

use std::time::Duration;

use pyfence_sandbox::{ChildReport, ChildStatus, ResourceLimits, SandboxError};
use pyfence_vetting::ViolationKind;
use rstest::rstest;
use serde_json::{Value, json};

use super::{MockSandbox, exited, idle_sandbox, printed, sandbox};
use crate::{Engine, ExecutionRequest, ExecutionType, FailureKind, TestCase};

fn engine_with(supervisor: MockSandbox) -> Engine<MockSandbox> {
    Engine::with_supervisor(supervisor, 2000, ResourceLimits::default())
}

#[rstest]
#[case::import_os("import os; os.system('ls')", ViolationKind::ForbiddenPattern)]
#[case::eval("eval('2+2')", ViolationKind::ForbiddenPattern)]
#[case::open_call("open('/etc/passwd').read()", ViolationKind::ForbiddenPattern)]
#[case::open_reference("reader = open", ViolationKind::DisallowedName)]
#[case::compile("compile('1', 's', 'single')", ViolationKind::DisallowedCall)]
#[case::dunder("().__class__", ViolationKind::ForbiddenPattern)]
#[case::definition("def f():\n    return 1", ViolationKind::DisallowedDefinition)]
#[case::import_socket("import socket", ViolationKind::DisallowedImport)]
#[case::syntax("print(1", ViolationKind::MalformedSyntax)]
#[case::fullwidth_eval("\u{ff45}val('2+2')", ViolationKind::DisallowedName)]
#[case::fullwidth_frame("(x for x in [1]).\u{ff47}i_frame", ViolationKind::DisallowedName)]
fn rejected_snippets_never_reach_the_supervisor(
    #[case] code: &str,
    #[case] violation: ViolationKind,
) {
    let engine = engine_with(idle_sandbox());
    let outcome = engine.execute(code);

    assert!(!outcome.success());
    assert_eq!(outcome.failure_kind(), Some(FailureKind::PolicyViolation));
    assert_eq!(outcome.violation(), Some(violation));
    assert!(outcome.error_detail().is_some());
}

#[test]
fn over_length_snippets_are_rejected_before_parsing() {
    let engine = engine_with(idle_sandbox());
    let outcome = engine.execute(&"a".repeat(5000));

    assert_eq!(outcome.failure_kind(), Some(FailureKind::LengthExceeded));
    assert_eq!(outcome.violation(), Some(ViolationKind::LengthExceeded));
}

#[test]
fn accepted_snippets_are_run_with_default_limits() {
    let mut supervisor = sandbox();
    supervisor
        .expect_run()
        .once()
        .withf(|job| job.code() == "2 + 3 * 4" && *job.limits() == ResourceLimits::default())
        .returning(|_| Ok(exited(ChildReport::new(ChildStatus::Ok).with_result("14"))));

    let outcome = engine_with(supervisor).execute("2 + 3 * 4");

    assert!(outcome.success());
    assert_eq!(outcome.failure_kind(), None);
    assert_eq!(outcome.result_value(), Some("14"));
    assert_eq!(outcome.execution_type(), ExecutionType::Expression);
}

#[test]
fn request_limits_override_engine_defaults() {
    let limits = ResourceLimits::default().with_timeout(Duration::from_secs(1));
    let mut supervisor = sandbox();
    supervisor
        .expect_run()
        .once()
        .withf(move |job| *job.limits() == limits)
        .returning(|_| Ok(printed("")));

    let request = ExecutionRequest::new("x = 1").with_limits(limits);
    assert!(engine_with(supervisor).execute_request(&request).success());
}

#[test]
fn context_variables_are_bound() {
    let mut supervisor = sandbox();
    supervisor
        .expect_run()
        .once()
        .withf(|job| job.variables().get("factor") == Some(&json!(3)))
        .returning(|_| Ok(printed("9\n")));

    let request = ExecutionRequest::new("print(factor * 3)").with_context("factor", json!(3));
    assert_eq!(engine_with(supervisor).execute_request(&request).stdout(), "9\n");
}

#[rstest]
#[case::dunder("__builtins__")]
#[case::builtin("print")]
#[case::module("math")]
#[case::input("test_input")]
#[case::keyword("lambda")]
#[case::malformed("two words")]
fn unsafe_context_names_are_rejected(#[case] name: &str) {
    let engine = engine_with(idle_sandbox());
    let request = ExecutionRequest::new("1").with_context(name, json!(1));
    let outcome = engine.execute_request(&request);

    assert_eq!(outcome.failure_kind(), Some(FailureKind::PolicyViolation));
    assert_eq!(outcome.violation(), Some(ViolationKind::DisallowedName));
}

#[test]
fn sandbox_failures_become_system_errors() {
    let mut supervisor = sandbox();
    supervisor
        .expect_run()
        .once()
        .returning(|_| Err(SandboxError::StreamUnavailable { stream: "stdout" }));

    let outcome = engine_with(supervisor).execute("1 + 1");

    assert_eq!(outcome.failure_kind(), Some(FailureKind::SystemError));
    let detail = outcome.error_detail().unwrap_or_default();
    assert!(!detail.contains("stdout"), "internal detail leaked: {detail}");
}

#[test]
fn test_input_is_bound_under_both_names() {
    let mut supervisor = sandbox();
    supervisor
        .expect_run()
        .once()
        .withf(|job| {
            job.variables().get("test_input") == Some(&json!(5))
                && job.variables().get("input_data") == Some(&json!(5))
        })
        .returning(|_| Ok(printed("10\n")));

    let result = engine_with(supervisor).run_test_case("print(test_input * 2)", json!(5), "10");

    assert!(result.passed);
    assert_eq!(result.actual, "10");
    assert_eq!(result.test_case, 1);
    assert_eq!(result.error, None);
}

#[rstest]
#[case::mismatch(printed("11\n"), false)]
#[case::surrounding_whitespace(printed("  10  \n\n"), true)]
#[case::runtime_error(
    exited(
        ChildReport::new(ChildStatus::Error)
            .with_stdout("10\n")
            .with_error("ValueError: late")
    ),
    false
)]
fn test_cases_pass_only_on_successful_matching_output(
    #[case] raw: pyfence_sandbox::RawExecution,
    #[case] passed: bool,
) {
    let mut supervisor = sandbox();
    supervisor.expect_run().once().return_once(move |_| Ok(raw));

    let result = engine_with(supervisor).run_test_case("print(test_input * 2)", json!(5), " 10 ");
    assert_eq!(result.passed, passed);
}

#[test]
fn validation_numbers_cases_and_aggregates() {
    let mut supervisor = sandbox();
    supervisor.expect_run().times(3).returning(|job| {
        let doubled = job
            .variables()
            .get("test_input")
            .and_then(Value::as_i64)
            .map_or(0, |input| input.saturating_mul(2));
        Ok(printed(&format!("{doubled}\n")))
    });

    let cases = [
        TestCase::new(json!(1), "2"),
        TestCase::new(json!(2), "5"),
        TestCase::new(json!(3), "6"),
    ];
    let report = engine_with(supervisor).validate_solution("print(test_input * 2)", &cases);

    assert_eq!(report.total_tests, 3);
    assert_eq!(report.passed_tests, 2);
    assert!(!report.all_passed);
    assert!((report.success_rate - 2.0 / 3.0).abs() < 1e-9);
    let numbers: Vec<usize> = report.results.iter().map(|r| r.test_case).collect();
    assert_eq!(numbers, [1, 2, 3]);
    assert_eq!(report.results.get(1).map(|r| r.actual.as_str()), Some("4"));
}

#[test]
fn cleanup_is_idempotent_and_disables_execution() {
    let mut engine = engine_with(idle_sandbox());
    engine.cleanup();
    engine.cleanup();

    let outcome = engine.execute("1 + 1");
    assert_eq!(outcome.failure_kind(), Some(FailureKind::SystemError));
}

#[test]
fn dropping_the_engine_cleans_up() {
    let engine = engine_with(idle_sandbox());
    drop(engine);
}

#[test]
fn cleanup_failures_are_swallowed() {
    let mut supervisor = MockSandbox::new();
    supervisor
        .expect_cleanup()
        .times(1)
        .returning(|| Err(SandboxError::CleanedUp));
    let mut engine = engine_with(supervisor);
    engine.cleanup();
}

#[test]
fn description_lists_modules_and_builtins() {
    let description = engine_with(idle_sandbox()).describe();
    assert!(description.contains("math"));
    assert!(description.contains("statistics"));
    assert!(description.contains("sorted"));
    assert!(description.contains("2000 characters"));
    assert!(!description.contains("eval,"));
}
