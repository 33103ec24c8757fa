//! The execution engine: vet, supervise, capture.

use std::time::{Duration, Instant};

use pyfence_config::Config;
use pyfence_sandbox::{
    ProcessSupervisor, ResourceLimits, RuntimeDescriptor, SandboxJob, Supervisor,
};
use pyfence_vetting::{StaticVetter, VettingPolicy};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::capture::{ResultCapturer, truncate_utf8};
use crate::error::EngineError;
use crate::outcome::ExecutionOutcome;
use crate::request::ExecutionRequest;
use crate::validation::{TestCase, TestCaseResult, ValidationReport};

/// Tracing target for engine operations.
const ENGINE_TARGET: &str = "pyfence::engine";

/// Bytes of snippet source included in log events.
const LOGGED_PREFIX_BYTES: usize = 48;

/// Runs untrusted snippets.
///
/// `execute` and friends take `&self` and may be called from many threads;
/// each call owns its child process. [`Engine::cleanup`] takes `&mut self`,
/// so it cannot overlap with a running execution. Dropping the engine
/// cleans up too.
///
/// ```rust,no_run
/// use pyfence::Engine;
/// use pyfence_config::Config;
///
/// # fn main() -> Result<(), pyfence::EngineError> {
/// let engine = Engine::from_config(&Config::default())?;
/// let outcome = engine.execute("2 + 3 * 4");
/// assert_eq!(outcome.result_value(), Some("14"));
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Engine<S: Supervisor = ProcessSupervisor> {
    supervisor: S,
    vetter: StaticVetter,
    runtime: RuntimeDescriptor,
    limits: ResourceLimits,
    cleaned_up: bool,
}

impl Engine<ProcessSupervisor> {
    /// Validates `config` and starts a process supervisor for it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] when the configuration is invalid and
    /// [`EngineError::Sandbox`] when the interpreter is unusable or the
    /// bootstrap cannot be installed.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        config.validate()?;
        let runtime = RuntimeDescriptor::standard();
        let supervisor = ProcessSupervisor::new(config.interpreter.clone(), runtime)?;
        info!(
            target: ENGINE_TARGET,
            interpreter = %config.interpreter,
            timeout_ms = config.timeout_ms,
            memory_limit_mb = config.memory_limit_mb,
            "execution engine ready"
        );
        Ok(Self::with_supervisor(
            supervisor,
            config.max_code_length,
            limits_from_config(config),
        ))
    }
}

impl<S: Supervisor> Engine<S> {
    /// Builds an engine around an existing supervisor.
    pub fn with_supervisor(supervisor: S, max_code_length: usize, limits: ResourceLimits) -> Self {
        let runtime = RuntimeDescriptor::standard();
        Self {
            supervisor,
            vetter: StaticVetter::new(VettingPolicy::new(max_code_length, runtime.modules())),
            runtime,
            limits,
            cleaned_up: false,
        }
    }

    /// Default limits applied to requests without their own.
    #[must_use]
    pub const fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// The runtime exposed to snippets.
    #[must_use]
    pub const fn runtime(&self) -> &RuntimeDescriptor {
        &self.runtime
    }

    /// Vets and runs a snippet with the default limits.
    #[must_use]
    pub fn execute(&self, code: &str) -> ExecutionOutcome {
        self.execute_request(&ExecutionRequest::new(code))
    }

    /// Vets and runs a request. Never panics and never returns an error:
    /// every failure is reported in the outcome.
    #[must_use]
    pub fn execute_request(&self, request: &ExecutionRequest) -> ExecutionOutcome {
        let started = Instant::now();
        let limits = request.limits().copied().unwrap_or(self.limits);
        let capturer = ResultCapturer::new(limits.max_output_bytes());

        if self.cleaned_up {
            warn!(target: ENGINE_TARGET, "execution requested after cleanup");
            return ResultCapturer::system_error("engine has been cleaned up", started.elapsed());
        }

        let verdict = self.vetter.vet(request.code());
        if !verdict.allowed() {
            info!(
                target: ENGINE_TARGET,
                violation = ?verdict.violation_kind(),
                snippet = %truncate_utf8(request.code(), LOGGED_PREFIX_BYTES),
                "snippet rejected before execution"
            );
            return ResultCapturer::rejected(&verdict, started.elapsed());
        }

        let reserved = self.runtime.reserved_names();
        if let Some(unsafe_name) = request
            .context()
            .keys()
            .map(|name| self.vetter.vet_binding_name(name, &reserved))
            .find(|binding| !binding.allowed())
        {
            return ResultCapturer::rejected(&unsafe_name, started.elapsed());
        }

        let job = SandboxJob::new(request.code(), limits).with_variables(request.bindings());
        match self.supervisor.run(&job) {
            Ok(raw) => {
                let outcome = capturer.capture(raw);
                debug!(
                    target: ENGINE_TARGET,
                    success = outcome.success(),
                    failure = ?outcome.failure_kind(),
                    "execution finished"
                );
                outcome
            }
            Err(error) => {
                warn!(target: ENGINE_TARGET, %error, "sandbox failed to run snippet");
                ResultCapturer::system_error("sandbox could not run the snippet", started.elapsed())
            }
        }
    }

    /// Runs `code` with `input` bound as `test_input` and compares trimmed
    /// stdout with `expected_output`.
    #[must_use]
    pub fn run_test_case(&self, code: &str, input: Value, expected_output: &str) -> TestCaseResult {
        self.run_case(code, &TestCase::new(input, expected_output))
    }

    /// Runs `code` against every case in order.
    #[must_use]
    pub fn validate_solution(&self, code: &str, cases: &[TestCase]) -> ValidationReport {
        let results = cases
            .iter()
            .enumerate()
            .map(|(index, case)| self.run_case(code, case).numbered(index.saturating_add(1)))
            .collect();
        let report = ValidationReport::from_results(results);
        info!(
            target: ENGINE_TARGET,
            total = report.total_tests,
            passed = report.passed_tests,
            "solution validated"
        );
        report
    }

    fn run_case(&self, code: &str, case: &TestCase) -> TestCaseResult {
        let request = ExecutionRequest::new(code).with_test_input(case.input.clone());
        TestCaseResult::from_outcome(case, &self.execute_request(&request))
    }

    /// Human-readable summary of what snippets may use.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut text = String::from(
            "Runs short Python snippets in an isolated interpreter and reports \
             their output.\n",
        );
        text.push_str(&format!(
            "Allowed modules: {}\n",
            self.runtime.modules().join(", ")
        ));
        text.push_str(&format!(
            "Allowed built-ins: {}\n",
            self.runtime.builtins().join(", ")
        ));
        text.push_str(&format!(
            "Limits: {} characters of code, {} ms wall clock, {} MiB memory, {} bytes of output.\n",
            self.vetter.policy().max_code_length(),
            duration_millis(self.limits.timeout()),
            self.limits.memory_bytes() >> 20,
            self.limits.max_output_bytes(),
        ));
        text.push_str(
            "The value of a final expression is returned. Use print() for other output. \
             Test input is available as `test_input`.\n",
        );
        text.push_str(
            "Not available: file and network access, function and class definitions, \
             reflection, eval/exec.",
        );
        text
    }

    /// Releases the supervisor's resources. Idempotent; later executions
    /// report a system error.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        match self.supervisor.cleanup() {
            Ok(()) => debug!(target: ENGINE_TARGET, "engine cleaned up"),
            Err(error) => warn!(target: ENGINE_TARGET, %error, "engine cleanup failed"),
        }
    }
}

impl<S: Supervisor> Drop for Engine<S> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn limits_from_config(config: &Config) -> ResourceLimits {
    ResourceLimits::default()
        .with_memory_bytes(config.memory_limit_bytes())
        .with_cpu_secs(config.cpu_limit_secs)
        .with_timeout(config.timeout())
        .with_grace_period(config.grace_period())
        .with_max_output_bytes(config.max_output_bytes)
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
