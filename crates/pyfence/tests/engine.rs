//! End-to-end engine tests against a real interpreter. Each test returns
//! early when no interpreter is installed.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use pyfence::{Engine, ExecutionRequest, ExecutionType, FailureKind, ResourceLimits, TestCase};
use pyfence_config::Config;
use serde_json::json;

const INTERPRETERS: &[&str] = &["/usr/bin/python3", "/usr/local/bin/python3", "/bin/python3"];

fn engine() -> Option<Engine> {
    let interpreter = INTERPRETERS.iter().find(|path| Path::new(path).exists())?;
    let config = Config {
        interpreter: Utf8PathBuf::from(*interpreter),
        timeout_ms: 2000,
        grace_period_ms: 200,
        ..Config::default()
    };
    Some(Engine::from_config(&config).expect("engine should start"))
}

#[test]
fn repeated_runs_are_deterministic() {
    let Some(engine) = engine() else {
        return;
    };
    let code = "import math\nvalues = sorted([3, 1, 2])\nmath.factorial(values[-1])";
    let first = engine.execute(code);
    let second = engine.execute(code);

    assert!(first.success(), "{first:?}");
    assert_eq!(first.result_value(), Some("6"));
    assert_eq!(first.result_value(), second.result_value());
    assert_eq!(first.variables(), second.variables());
    assert_eq!(first.variables().get("values").map(String::as_str), Some("[1, 2, 3]"));
}

#[test]
fn statements_report_no_result() {
    let Some(engine) = engine() else {
        return;
    };
    let outcome = engine.execute("total = 0\nfor i in range(4):\n    total += i\nprint(total)");

    assert!(outcome.success(), "{outcome:?}");
    assert_eq!(outcome.execution_type(), ExecutionType::Statements);
    assert_eq!(outcome.result_value(), None);
    assert_eq!(outcome.stdout(), "6\n");
}

#[test]
fn wide_characters_are_truncated_not_lost() {
    let Some(engine) = engine() else {
        return;
    };
    let outcome = engine.execute("s = '\u{1f600}' * 20000\nprint(s)\ns");
    let cap = engine.limits().max_output_bytes();

    assert!(outcome.success(), "{outcome:?}");
    assert!(!outcome.stdout().is_empty());
    assert!(outcome.stdout().len() <= cap);
    assert!(outcome.stdout().chars().all(|c| c == '\u{1f600}'));
    assert!(outcome.result_value().is_some_and(|value| value.len() <= cap));
}

#[test]
fn fullwidth_frame_walks_are_rejected() {
    let Some(engine) = engine() else {
        return;
    };
    let code = "g = (g.\u{ff47}i_frame.\u{ff46}_back.\u{ff46}_back.\u{ff46}_globals for _ in [1])\n\
                m = list(g)[0]\n\
                b = m['built' + 'ins']\n\
                f = b.open\n\
                f('/etc/hostname').read()";
    let outcome = engine.execute(code);

    assert_eq!(outcome.failure_kind(), Some(FailureKind::PolicyViolation), "{outcome:?}");
    assert!(outcome.stdout().is_empty());
    assert!(outcome.result_value().is_none());
}

#[test]
fn runtime_errors_are_reported() {
    let Some(engine) = engine() else {
        return;
    };
    let outcome = engine.execute("values = [1, 2]\nvalues[5]");

    assert_eq!(outcome.failure_kind(), Some(FailureKind::RuntimeError));
    assert!(
        outcome
            .error_detail()
            .is_some_and(|detail| detail.starts_with("IndexError")),
        "{outcome:?}"
    );
}

#[test]
fn memory_exhaustion_is_contained() {
    let Some(engine) = engine() else {
        return;
    };
    let limits = ResourceLimits::default().with_memory_bytes(128 * 1024 * 1024);
    let request = ExecutionRequest::new("blocks = [0] * (10 ** 9)").with_limits(limits);
    let outcome = engine.execute_request(&request);

    assert_eq!(outcome.failure_kind(), Some(FailureKind::MemoryExceeded), "{outcome:?}");
}

#[test]
fn timeouts_hold_when_exceptions_are_swallowed() {
    let Some(engine) = engine() else {
        return;
    };
    let code = "while True:\n    try:\n        while True:\n            pass\n    except:\n        pass";
    let started = Instant::now();
    let outcome = engine.execute(code);

    assert_eq!(outcome.failure_kind(), Some(FailureKind::Timeout), "{outcome:?}");
    assert!(started.elapsed() < Duration::from_millis(3500));
}

#[test]
fn context_variables_reach_the_snippet() {
    let Some(engine) = engine() else {
        return;
    };
    let request = ExecutionRequest::new("sum(numbers) * factor")
        .with_context("numbers", json!([1, 2, 3]))
        .with_context("factor", json!(10));

    assert_eq!(engine.execute_request(&request).result_value(), Some("60"));
}

#[test]
fn concurrent_executions_do_not_interfere() {
    let Some(engine) = engine() else {
        return;
    };
    let results: Vec<Option<String>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let engine = &engine;
                scope.spawn(move || {
                    engine
                        .execute(&format!("{n} * 100"))
                        .result_value()
                        .map(str::to_owned)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker should not panic"))
            .collect()
    });

    let expected: Vec<Option<String>> = (0..4).map(|n| Some((n * 100).to_string())).collect();
    assert_eq!(results, expected);
}

#[test]
fn solutions_are_validated_case_by_case() {
    let Some(engine) = engine() else {
        return;
    };
    let cases = [
        TestCase::new(json!([3, 1, 2]), "[1, 2, 3]"),
        TestCase::new(json!([]), "[]"),
        TestCase::new(json!("abc"), "['a', 'b', 'c']"),
    ];
    let report = engine.validate_solution("print(sorted(test_input))", &cases);

    assert_eq!(report.total_tests, 3);
    assert!(report.all_passed, "{report:?}");
    assert!((report.success_rate - 1.0).abs() < f64::EPSILON);
}

#[test]
fn cleanup_disables_further_execution() {
    let Some(mut engine) = engine() else {
        return;
    };
    assert!(engine.execute("1").success());
    engine.cleanup();
    assert_eq!(
        engine.execute("1").failure_kind(),
        Some(FailureKind::SystemError)
    );
}
