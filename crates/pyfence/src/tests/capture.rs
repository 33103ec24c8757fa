//! Normalisation of raw child runs into outcomes.

use std::time::Duration;

use nix::sys::signal::Signal;
use pyfence_sandbox::{ChildReport, ChildStatus, ExecutionType, RawExecution, Termination};
use rstest::rstest;

use super::exited;
use crate::{FailureKind, ResultCapturer, truncate_utf8};

fn raw(termination: Termination, report: Option<ChildReport>, stderr: &str) -> RawExecution {
    RawExecution {
        termination,
        report,
        stderr: String::from(stderr),
        elapsed: Duration::from_millis(40),
    }
}

fn signalled(signal: Signal) -> Termination {
    Termination::Signalled {
        signal: signal as i32,
    }
}

#[rstest]
#[case::watchdog(raw(Termination::TimedOut, None, ""), FailureKind::Timeout)]
#[case::cpu_limit(raw(signalled(Signal::SIGXCPU), None, ""), FailureKind::Timeout)]
#[case::killed(raw(signalled(Signal::SIGKILL), None, ""), FailureKind::MemoryExceeded)]
#[case::segfault(raw(signalled(Signal::SIGSEGV), None, ""), FailureKind::MemoryExceeded)]
#[case::abort(raw(signalled(Signal::SIGABRT), None, ""), FailureKind::SystemError)]
#[case::memory_on_stderr(
    raw(Termination::Exited { code: 1 }, None, "MemoryError\n"),
    FailureKind::MemoryExceeded
)]
#[case::no_report(raw(Termination::Exited { code: 1 }, None, "boom"), FailureKind::SystemError)]
#[case::raised(
    exited(ChildReport::new(ChildStatus::Error).with_error("ZeroDivisionError: division by zero")),
    FailureKind::RuntimeError
)]
#[case::inner_timer(exited(ChildReport::new(ChildStatus::Timeout)), FailureKind::Timeout)]
#[case::memory(exited(ChildReport::new(ChildStatus::Memory)), FailureKind::MemoryExceeded)]
#[case::internal(
    exited(ChildReport::new(ChildStatus::Internal).with_error("KeyError: 'modules'")),
    FailureKind::SystemError
)]
fn failures_are_classified(#[case] raw: RawExecution, #[case] expected: FailureKind) {
    let outcome = ResultCapturer::new(1024).capture(raw);

    assert!(!outcome.success());
    assert_eq!(outcome.failure_kind(), Some(expected));
    assert!(outcome.error_detail().is_some());
    assert!(outcome.result_value().is_none());
}

#[test]
fn runtime_errors_carry_the_exception_summary() {
    let report = ChildReport::new(ChildStatus::Error)
        .with_stdout("partial\n")
        .with_error("ZeroDivisionError: division by zero");
    let outcome = ResultCapturer::new(1024).capture(exited(report));

    assert_eq!(
        outcome.error_detail(),
        Some("ZeroDivisionError: division by zero")
    );
    assert_eq!(outcome.stdout(), "partial\n");
}

#[test]
fn internal_failures_do_not_leak_detail() {
    let report = ChildReport::new(ChildStatus::Internal).with_error("KeyError: 'modules'");
    let outcome = ResultCapturer::new(1024).capture(exited(report));

    let detail = outcome.error_detail().unwrap_or_default();
    assert!(!detail.contains("KeyError"), "leaked: {detail}");
}

#[test]
fn success_carries_result_output_and_variables() {
    let report = ChildReport::new(ChildStatus::Ok)
        .with_result("14")
        .with_stdout("hello\n")
        .with_variable("x", "[1, 2]");
    let outcome = ResultCapturer::new(1024).capture(exited(report));

    assert!(outcome.success());
    assert_eq!(outcome.failure_kind(), None);
    assert_eq!(outcome.result_value(), Some("14"));
    assert_eq!(outcome.execution_type(), ExecutionType::Expression);
    assert_eq!(outcome.stdout(), "hello\n");
    assert_eq!(outcome.variables().get("x").map(String::as_str), Some("[1, 2]"));
    assert!((outcome.execution_time() - 0.012).abs() < 1e-9);
}

#[test]
fn output_is_truncated_on_a_character_boundary() {
    let report = ChildReport::new(ChildStatus::Ok).with_stdout("ééééé");
    let outcome = ResultCapturer::new(5).capture(exited(report));
    assert_eq!(outcome.stdout(), "éé");
}

#[test]
fn timed_out_runs_keep_partial_output() {
    let report = ChildReport::new(ChildStatus::Ok).with_stdout("tick\n");
    let outcome = ResultCapturer::new(1024).capture(raw(Termination::TimedOut, Some(report), ""));
    assert_eq!(outcome.failure_kind(), Some(FailureKind::Timeout));
    assert_eq!(outcome.stdout(), "tick\n");
}

#[rstest]
#[case("", 0, "")]
#[case("abc", 10, "abc")]
#[case("abc", 2, "ab")]
#[case("aé", 2, "a")]
#[case("日本", 4, "日")]
fn truncation_respects_utf8(#[case] text: &str, #[case] max: usize, #[case] expected: &str) {
    assert_eq!(truncate_utf8(text, max), expected);
}
