//! Unit tests for the engine and result capturer.

mod capture;
mod engine;

use std::time::Duration;

use mockall::mock;
use pyfence_sandbox::{
    ChildReport, ChildStatus, RawExecution, SandboxError, SandboxJob, Supervisor, Termination,
};

mock! {
    Sandbox {}
    impl Supervisor for Sandbox {
        fn run(&self, job: &SandboxJob) -> Result<RawExecution, SandboxError>;
        fn cleanup(&mut self) -> Result<(), SandboxError>;
    }
}

/// A double that expects exactly one cleanup, from the engine's drop or an
/// explicit call.
fn sandbox() -> MockSandbox {
    let mut sandbox = MockSandbox::new();
    sandbox.expect_cleanup().times(1).returning(|| Ok(()));
    sandbox
}

/// A double that must never be asked to run anything.
fn idle_sandbox() -> MockSandbox {
    let mut sandbox = sandbox();
    sandbox.expect_run().times(0);
    sandbox
}

/// A clean exit carrying `report`.
fn exited(report: ChildReport) -> RawExecution {
    RawExecution {
        termination: Termination::Exited { code: 0 },
        report: Some(report),
        stderr: String::new(),
        elapsed: Duration::from_millis(12),
    }
}

/// A successful report whose stdout is `stdout`.
fn printed(stdout: &str) -> RawExecution {
    exited(ChildReport::new(ChildStatus::Ok).with_stdout(stdout))
}

/// Locates a Python 3 interpreter for tests that launch real children.
pub(crate) fn python3() -> Option<camino::Utf8PathBuf> {
    ["/usr/bin/python3", "/usr/local/bin/python3", "/bin/python3"]
        .into_iter()
        .map(camino::Utf8PathBuf::from)
        .find(|path| path.exists())
}
