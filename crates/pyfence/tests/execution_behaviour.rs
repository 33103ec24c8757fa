//! Behaviour-driven tests for the execution engine against a real
//! interpreter. Steps do nothing when no interpreter is installed.

use std::cell::RefCell;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use pyfence::{Engine, ExecutionOutcome, FailureKind, TestCaseResult};
use pyfence_config::Config;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

const INTERPRETERS: &[&str] = &["/usr/bin/python3", "/usr/local/bin/python3", "/bin/python3"];

#[derive(Default)]
struct TestWorld {
    engine: Option<Engine>,
    outcome: Option<ExecutionOutcome>,
    test_result: Option<TestCaseResult>,
    elapsed: Option<Duration>,
}

impl TestWorld {
    fn execute(&mut self, code: &str) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let started = Instant::now();
        self.outcome = Some(engine.execute(code));
        self.elapsed = Some(started.elapsed());
    }
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

fn start_engine(world: &RefCell<TestWorld>, timeout_ms: u64) {
    let Some(interpreter) = INTERPRETERS.iter().find(|path| Path::new(path).exists()) else {
        return;
    };
    let config = Config {
        interpreter: Utf8PathBuf::from(*interpreter),
        timeout_ms,
        ..Config::default()
    };
    let engine = Engine::from_config(&config).expect("engine should start");
    world.borrow_mut().engine = Some(engine);
}

#[given("an engine with default limits")]
fn given_default_engine(world: &RefCell<TestWorld>) {
    start_engine(world, Config::default().timeout_ms);
}

#[given("an engine with a timeout of {millis} milliseconds")]
fn given_engine(world: &RefCell<TestWorld>, millis: u64) {
    start_engine(world, millis);
}

#[when("the snippet \"{code}\" is executed")]
fn when_executed(world: &RefCell<TestWorld>, code: String) {
    world.borrow_mut().execute(&code);
}

#[when("a snippet of {count} repeated characters is executed")]
fn when_repeated_executed(world: &RefCell<TestWorld>, count: usize) {
    world.borrow_mut().execute(&"a".repeat(count));
}

#[when("the snippet \"{code}\" is tested with input \"{input}\" expecting \"{expected}\"")]
fn when_tested(world: &RefCell<TestWorld>, code: String, input: String, expected: String) {
    let mut w = world.borrow_mut();
    let Some(engine) = w.engine.as_ref() else {
        return;
    };
    let value: Value = serde_json::from_str(&input).expect("input should be JSON");
    let result = engine.run_test_case(&code, value, &expected);
    w.test_result = Some(result);
}

#[then("the execution succeeds with result \"{result}\"")]
fn then_succeeds(world: &RefCell<TestWorld>, result: String) {
    let w = world.borrow();
    let Some(outcome) = w.outcome.as_ref() else {
        return;
    };
    assert!(outcome.success(), "unexpected failure: {outcome:?}");
    assert_eq!(outcome.failure_kind(), None);
    assert_eq!(outcome.result_value(), Some(result.as_str()));
}

#[then("the execution fails as \"{kind}\"")]
fn then_fails(world: &RefCell<TestWorld>, kind: String) {
    let w = world.borrow();
    let Some(outcome) = w.outcome.as_ref() else {
        return;
    };
    let expected = FailureKind::from_str(&kind).expect("known failure kind");
    assert!(!outcome.success());
    assert_eq!(outcome.failure_kind(), Some(expected), "{outcome:?}");
}

#[then("the execution returned within {millis} milliseconds")]
fn then_returned_within(world: &RefCell<TestWorld>, millis: u64) {
    if let Some(elapsed) = world.borrow().elapsed {
        assert!(elapsed < Duration::from_millis(millis), "took {elapsed:?}");
    }
}

#[then("the test case passes")]
fn then_test_passes(world: &RefCell<TestWorld>) {
    let w = world.borrow();
    let Some(result) = w.test_result.as_ref() else {
        return;
    };
    assert!(result.passed, "test case failed: {result:?}");
    assert_eq!(result.actual, "10");
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Arithmetic evaluates to its value"
)]
fn arithmetic_evaluates(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Shell access is refused before running"
)]
fn shell_access_refused(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Infinite loops are stopped by the timeout"
)]
fn infinite_loops_time_out(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Dynamic evaluation is refused"
)]
fn dynamic_evaluation_refused(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Test input is bound for test cases"
)]
fn test_input_bound(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/execution.feature",
    name = "Oversized snippets are refused without parsing"
)]
fn oversized_snippets_refused(world: RefCell<TestWorld>) {
    drop(world);
}
