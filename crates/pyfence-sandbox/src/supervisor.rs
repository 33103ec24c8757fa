//! Process-based execution of vetted snippets.
//!
//! [`ProcessSupervisor`] implements the [`Supervisor`] trait by spawning a
//! fresh interpreter in its own process group with rlimits applied before
//! exec, writing the request to stdin as a single JSON line, draining stdout
//! and stderr on background threads, and racing the child against a
//! [`Watchdog`]. Every child it spawns is reaped before `run` returns.

use std::collections::BTreeMap;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use nix::sys::signal::Signal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bootstrap::BootstrapScript;
use crate::capture::PipeCapture;
use crate::confine::confine;
use crate::error::SandboxError;
use crate::limits::ResourceLimits;
use crate::protocol::{ChildReport, ChildRequest};
use crate::runtime::RuntimeDescriptor;
use crate::watchdog::{Watchdog, signal_group};

/// Tracing target for supervisor operations.
pub(crate) const SUPERVISOR_TARGET: &str = "pyfence_sandbox::supervisor";

/// Interpreter flags: isolated mode, no site packages, no bytecode files,
/// UTF-8 streams.
const INTERPRETER_FLAGS: &[&str] = &["-I", "-S", "-B", "-X", "utf8"];

/// One vetted snippet ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxJob {
    code: String,
    limits: ResourceLimits,
    variables: BTreeMap<String, Value>,
}

impl SandboxJob {
    /// Creates a job with no bound variables.
    pub fn new(code: impl Into<String>, limits: ResourceLimits) -> Self {
        Self {
            code: code.into(),
            limits,
            variables: BTreeMap::new(),
        }
    }

    /// Binds variables visible to the snippet.
    #[must_use]
    pub fn with_variables(mut self, variables: BTreeMap<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    /// The snippet source.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Limits for this run.
    #[must_use]
    pub const fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Variables bound before the snippet runs.
    #[must_use]
    pub const fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }
}

/// How the child process ended, as seen by the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process exited on its own with this code.
    Exited {
        /// Exit code.
        code: i32,
    },
    /// The process was killed by a signal it was not sent by the watchdog.
    Signalled {
        /// Raw signal number.
        signal: i32,
    },
    /// The watchdog terminated the process group.
    TimedOut,
}

impl Termination {
    /// The terminating signal, when known to `nix`.
    #[must_use]
    pub fn signal(&self) -> Option<Signal> {
        match self {
            Self::Signalled { signal } => Signal::try_from(*signal).ok(),
            Self::Exited { .. } | Self::TimedOut => None,
        }
    }
}

/// Everything observed about one child run, before normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExecution {
    /// How the process ended.
    pub termination: Termination,
    /// The bootstrap's report, when one was written and parsed.
    pub report: Option<ChildReport>,
    /// Interpreter-level stderr, outside the snippet's own captured stderr.
    pub stderr: String,
    /// Wall-clock time from spawn to reap.
    pub elapsed: Duration,
}

/// Runs vetted snippets in isolation.
///
/// The engine is generic over this trait so tests can substitute a double
/// and prove that rejected snippets never reach it.
pub trait Supervisor: Send + Sync {
    /// Runs one job to completion, timeout or crash.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] when the child cannot be launched or
    /// supervised. Snippet failures are reported in [`RawExecution`].
    fn run(&self, job: &SandboxJob) -> Result<RawExecution, SandboxError>;

    /// Releases resources held by the supervisor. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] when a resource could not be released.
    fn cleanup(&mut self) -> Result<(), SandboxError>;
}

/// Supervisor that launches a configured interpreter per job.
#[derive(Debug)]
pub struct ProcessSupervisor {
    interpreter: Utf8PathBuf,
    runtime: RuntimeDescriptor,
    bootstrap: BootstrapScript,
}

impl ProcessSupervisor {
    /// Validates the interpreter path and installs the bootstrap script.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::ProgramNotAbsolute`] or
    /// [`SandboxError::MissingPath`] for a bad interpreter, and
    /// [`SandboxError::Bootstrap`] when the script cannot be written.
    pub fn new(
        interpreter_path: impl Into<Utf8PathBuf>,
        runtime: RuntimeDescriptor,
    ) -> Result<Self, SandboxError> {
        let interpreter = interpreter_path.into();
        if !interpreter.is_absolute() {
            return Err(SandboxError::ProgramNotAbsolute(interpreter));
        }
        if !interpreter.exists() {
            return Err(SandboxError::MissingPath { path: interpreter });
        }
        let bootstrap = BootstrapScript::install()?;
        Ok(Self {
            interpreter,
            runtime,
            bootstrap,
        })
    }

    /// The interpreter launched for each job.
    #[must_use]
    pub fn interpreter(&self) -> &Utf8Path {
        &self.interpreter
    }

    /// Location of the bootstrap script, or `None` after cleanup.
    #[must_use]
    pub fn bootstrap_path(&self) -> Option<&Utf8Path> {
        self.bootstrap.path()
    }

    fn command(&self, script: &Utf8Path, limits: &ResourceLimits) -> Command {
        let mut command = Command::new(self.interpreter.as_std_path());
        command
            .args(INTERPRETER_FLAGS)
            .arg(script.as_std_path())
            .env_clear()
            .current_dir("/")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        confine(&mut command, limits);
        command
    }
}

impl Supervisor for ProcessSupervisor {
    fn run(&self, job: &SandboxJob) -> Result<RawExecution, SandboxError> {
        let script = self.bootstrap.path().ok_or(SandboxError::CleanedUp)?;
        let request = ChildRequest::new(job.code(), job.limits(), self.runtime, job.variables());
        let mut payload = serde_json::to_vec(&request).map_err(|error| SandboxError::Request {
            message: error.to_string(),
        })?;
        payload.push(b'\n');

        let limits = job.limits();
        let started = Instant::now();
        let mut child = self
            .command(script, limits)
            .spawn()
            .map_err(SandboxError::spawn)?;
        debug!(
            target: SUPERVISOR_TARGET,
            pid = child.id(),
            interpreter = %self.interpreter,
            request_bytes = payload.len(),
            "spawned child interpreter"
        );

        let streams = match attach_streams(&mut child, payload, limits) {
            Ok(streams) => streams,
            Err(error) => {
                abandon(&mut child);
                return Err(error);
            }
        };

        let watchdog = Watchdog::new(limits.timeout(), limits.grace_period());
        let completion = match watchdog.supervise(&mut child, started) {
            Ok(completion) => completion,
            Err(error) => {
                abandon(&mut child);
                return Err(error);
            }
        };

        let stdout = streams.stdout.finish();
        let stderr = streams.stderr.finish();
        join_writer(streams.writer);

        let termination = if completion.timed_out {
            Termination::TimedOut
        } else if let Some(signal) = completion.status.signal() {
            Termination::Signalled { signal }
        } else {
            Termination::Exited {
                code: completion.status.code().unwrap_or(-1),
            }
        };

        let report = match ChildReport::parse(&String::from_utf8_lossy(&stdout)) {
            Ok(report) => Some(report),
            Err(error) => {
                debug!(target: SUPERVISOR_TARGET, %error, "child wrote no usable report");
                None
            }
        };

        debug!(
            target: SUPERVISOR_TARGET,
            ?termination,
            elapsed_ms = u64::try_from(completion.elapsed.as_millis()).unwrap_or(u64::MAX),
            "child interpreter reaped"
        );

        Ok(RawExecution {
            termination,
            report,
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            elapsed: completion.elapsed,
        })
    }

    fn cleanup(&mut self) -> Result<(), SandboxError> {
        self.bootstrap.remove()
    }
}

struct Streams {
    stdout: PipeCapture,
    stderr: PipeCapture,
    writer: JoinHandle<()>,
}

fn attach_streams(
    child: &mut Child,
    payload: Vec<u8>,
    limits: &ResourceLimits,
) -> Result<Streams, SandboxError> {
    let stdin = child
        .stdin
        .take()
        .ok_or(SandboxError::StreamUnavailable { stream: "stdin" })?;
    let stdout_pipe = child
        .stdout
        .take()
        .ok_or(SandboxError::StreamUnavailable { stream: "stdout" })?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or(SandboxError::StreamUnavailable { stream: "stderr" })?;

    let stdout = PipeCapture::spawn("stdout", stdout_pipe, limits.report_capacity())
        .map_err(SandboxError::spawn)?;
    let stderr = PipeCapture::spawn("stderr", stderr_pipe, limits.max_output_bytes())
        .map_err(SandboxError::spawn)?;
    let writer = spawn_writer(stdin, payload).map_err(SandboxError::spawn)?;
    Ok(Streams {
        stdout,
        stderr,
        writer,
    })
}

/// Writes the request on a separate thread so a child that never reads its
/// stdin cannot stall the watchdog.
fn spawn_writer(mut stdin: ChildStdin, payload: Vec<u8>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(String::from("pyfence-stdin"))
        .spawn(move || {
            if let Err(error) = stdin.write_all(&payload).and_then(|()| stdin.flush()) {
                debug!(target: SUPERVISOR_TARGET, %error, "failed to write child request");
            }
            // Dropping stdin closes the pipe and signals end of input.
        })
}

fn join_writer(writer: JoinHandle<()>) {
    if writer.join().is_err() {
        warn!(target: SUPERVISOR_TARGET, "request writer panicked");
    }
}

/// Kills and reaps a child whose supervision could not continue.
fn abandon(child: &mut Child) {
    signal_group(child, Signal::SIGKILL);
    if let Err(error) = child.wait() {
        warn!(target: SUPERVISOR_TARGET, %error, "failed to reap abandoned child");
    }
}
