//! Normalisation of every execution path into an [`ExecutionOutcome`].

use std::time::Duration;

use nix::sys::signal::Signal;
use pyfence_sandbox::{ChildReport, ChildStatus, RawExecution, Termination};
use pyfence_vetting::{SafetyVerdict, ViolationKind};
use tracing::{debug, warn};

use crate::outcome::{ExecutionOutcome, FailureKind};

/// Tracing target for outcome normalisation.
const CAPTURE_TARGET: &str = "pyfence::capture";

const TIMEOUT_DETAIL: &str = "execution exceeded the time limit";
const CPU_DETAIL: &str = "execution exceeded the CPU time limit";
const MEMORY_DETAIL: &str = "execution exceeded the memory limit";
const NO_REPORT_DETAIL: &str = "interpreter produced no result";
const ABNORMAL_DETAIL: &str = "interpreter terminated abnormally";
const INTERNAL_DETAIL: &str = "sandbox runtime failed to start";

/// Builds outcomes with stdout and stderr bounded to `max_output_bytes`.
#[derive(Debug, Clone, Copy)]
pub struct ResultCapturer {
    max_output_bytes: usize,
}

impl ResultCapturer {
    /// Creates a capturer for the given output cap.
    #[must_use]
    pub const fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }

    /// Outcome for a snippet that vetting refused.
    #[must_use]
    pub fn rejected(verdict: &SafetyVerdict, elapsed: Duration) -> ExecutionOutcome {
        let violation = verdict.violation_kind();
        let kind = match violation {
            Some(ViolationKind::LengthExceeded) => FailureKind::LengthExceeded,
            _ => FailureKind::PolicyViolation,
        };
        let detail = verdict.detail().unwrap_or("snippet rejected");
        ExecutionOutcome::failed(kind, detail, elapsed).with_violation(violation)
    }

    /// Outcome for a run the engine could not complete.
    #[must_use]
    pub fn system_error(detail: &str, elapsed: Duration) -> ExecutionOutcome {
        ExecutionOutcome::failed(FailureKind::SystemError, detail, elapsed)
    }

    /// Outcome for a supervised child run.
    #[must_use]
    pub fn capture(&self, raw: RawExecution) -> ExecutionOutcome {
        let RawExecution {
            termination,
            report,
            stderr,
            elapsed,
        } = raw;

        if !stderr.is_empty() {
            debug!(
                target: CAPTURE_TARGET,
                interpreter_stderr = %truncate_utf8(&stderr, 512),
                "interpreter wrote diagnostics"
            );
        }

        match (termination, report.as_ref()) {
            (Termination::TimedOut, partial) => self.with_report_output(
                ExecutionOutcome::failed(FailureKind::Timeout, TIMEOUT_DETAIL, elapsed),
                partial,
            ),
            (Termination::Signalled { .. }, partial) => {
                let (kind, detail) = classify_signal(termination.signal());
                self.with_report_output(ExecutionOutcome::failed(kind, detail, elapsed), partial)
            }
            (Termination::Exited { .. }, Some(written)) => self.from_report(written, elapsed),
            (Termination::Exited { code }, None) => {
                if stderr.contains("MemoryError") {
                    ExecutionOutcome::failed(FailureKind::MemoryExceeded, MEMORY_DETAIL, elapsed)
                } else {
                    warn!(target: CAPTURE_TARGET, exit_code = code, "child exited without a report");
                    ExecutionOutcome::failed(FailureKind::SystemError, NO_REPORT_DETAIL, elapsed)
                }
            }
        }
    }

    fn from_report(&self, report: &ChildReport, elapsed: Duration) -> ExecutionOutcome {
        let outcome = match report.status() {
            ChildStatus::Ok => ExecutionOutcome::succeeded(elapsed)
                .with_result(
                    report.result().map(|value| self.bound(value)),
                    report.execution_type(),
                )
                .with_variables(report.variables().clone()),
            ChildStatus::Error => ExecutionOutcome::failed(
                FailureKind::RuntimeError,
                self.bound(report.error().unwrap_or("snippet raised an exception")),
                elapsed,
            ),
            ChildStatus::Timeout => {
                ExecutionOutcome::failed(FailureKind::Timeout, TIMEOUT_DETAIL, elapsed)
            }
            ChildStatus::Memory => {
                ExecutionOutcome::failed(FailureKind::MemoryExceeded, MEMORY_DETAIL, elapsed)
            }
            ChildStatus::Internal => {
                warn!(
                    target: CAPTURE_TARGET,
                    error = report.error().unwrap_or_default(),
                    "bootstrap failed inside the child"
                );
                ExecutionOutcome::failed(FailureKind::SystemError, INTERNAL_DETAIL, elapsed)
            }
        };
        self.with_report_output(outcome, Some(report))
    }

    fn with_report_output(
        &self,
        outcome: ExecutionOutcome,
        report: Option<&ChildReport>,
    ) -> ExecutionOutcome {
        match report {
            Some(written) => {
                outcome.with_output(self.bound(written.stdout()), self.bound(written.stderr()))
            }
            None => outcome,
        }
    }

    fn bound(&self, text: &str) -> String {
        truncate_utf8(text, self.max_output_bytes).to_owned()
    }
}

/// Maps a signal the watchdog did not send onto a failure kind.
fn classify_signal(signal: Option<Signal>) -> (FailureKind, &'static str) {
    match signal {
        Some(Signal::SIGXCPU) => (FailureKind::Timeout, CPU_DETAIL),
        // The kernel's out-of-memory killer and allocation failures past
        // RLIMIT_AS surface as these.
        Some(Signal::SIGKILL | Signal::SIGSEGV | Signal::SIGBUS) => {
            (FailureKind::MemoryExceeded, MEMORY_DETAIL)
        }
        other => {
            warn!(target: CAPTURE_TARGET, signal = ?other, "child killed by unexpected signal");
            (FailureKind::SystemError, ABNORMAL_DETAIL)
        }
    }
}

/// Returns the longest prefix of `text` that fits in `max_bytes` without
/// splitting a character.
#[must_use]
pub fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    text.get(..end).unwrap_or_default()
}
