//! Isolated execution of vetted Python snippets.
//!
//! The `pyfence-sandbox` crate owns the lifecycle of every child
//! interpreter. A [`ProcessSupervisor`] launches the configured interpreter
//! with a clean environment, in its own process group, with rlimits applied
//! between fork and exec (address space, CPU seconds, file size, process
//! count, open files, core dumps) and a parent-death signal. The child runs
//! a bootstrap wrapper that exposes only the names in a
//! [`RuntimeDescriptor`], arms an in-process interval timer, and captures
//! output into bounded buffers. A [`Watchdog`] enforces the wall-clock
//! timeout from outside, escalating from SIGTERM to SIGKILL on the whole
//! process group.
//!
//! ```rust,no_run
//! use pyfence_sandbox::{
//!     ProcessSupervisor, ResourceLimits, RuntimeDescriptor, SandboxJob, Supervisor,
//! };
//!
//! # fn main() -> Result<(), pyfence_sandbox::SandboxError> {
//! let mut supervisor =
//!     ProcessSupervisor::new("/usr/bin/python3", RuntimeDescriptor::standard())?;
//! let raw = supervisor.run(&SandboxJob::new("2 + 3", ResourceLimits::default()))?;
//! assert_eq!(raw.report.and_then(|r| r.result().map(str::to_owned)), Some("5".into()));
//! supervisor.cleanup()?;
//! # Ok(()) }
//! ```
//!
//! The supervisor never decides whether code is safe to run; callers must
//! vet snippets first.

mod bootstrap;
mod capture;
mod confine;
mod error;
mod limits;
mod protocol;
mod runtime;
mod supervisor;
mod watchdog;

pub use bootstrap::{BOOTSTRAP_SOURCE, BootstrapScript};
pub use error::SandboxError;
pub use limits::{MAX_REPORTED_VARIABLES, MAX_VARIABLE_REPR, ResourceLimits};
pub use protocol::{ChildReport, ChildRequest, ChildStatus, ExecutionType};
pub use runtime::{INPUT_BINDINGS, RuntimeDescriptor};
pub use supervisor::{ProcessSupervisor, RawExecution, SandboxJob, Supervisor, Termination};
pub use watchdog::{Completion, Watchdog};

#[cfg(test)]
mod tests;
