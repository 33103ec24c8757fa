//! Wall-clock enforcement for child processes.
//!
//! The watchdog polls the child until it exits or the deadline passes. On
//! expiry it sends SIGTERM to the whole process group, waits out the grace
//! period, then sends SIGKILL to the group unconditionally and reaps the
//! child. It returns within `timeout + grace + poll interval`.

use std::io;
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::SandboxError;

/// Tracing target for timeout enforcement.
const WATCHDOG_TARGET: &str = "pyfence_sandbox::watchdog";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a supervised child finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Exit status reported by the operating system.
    pub status: ExitStatus,
    /// Whether the watchdog had to terminate the child.
    pub timed_out: bool,
    /// Time from `started` until the child was reaped.
    pub elapsed: Duration,
}

/// Races a child process against a deadline.
#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    timeout: Duration,
    grace_period: Duration,
    poll_interval: Duration,
}

impl Watchdog {
    /// Creates a watchdog with the default 50 ms poll interval.
    #[must_use]
    pub const fn new(timeout: Duration, grace_period: Duration) -> Self {
        Self {
            timeout,
            grace_period,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Waits for the child, terminating its process group on timeout. The
    /// child is always reaped before this returns `Ok`.
    ///
    /// The child must lead its own process group.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Supervision`] when waiting on the child fails.
    pub fn supervise(&self, child: &mut Child, started: Instant) -> Result<Completion, SandboxError> {
        let deadline = started + self.timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(SandboxError::supervision)? {
                return Ok(Completion {
                    status,
                    timed_out: false,
                    elapsed: started.elapsed(),
                });
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }

        warn!(
            target: WATCHDOG_TARGET,
            pid = child.id(),
            timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            "execution timed out, terminating process group"
        );
        let status = self.terminate(child)?;
        Ok(Completion {
            status,
            timed_out: true,
            elapsed: started.elapsed(),
        })
    }

    fn terminate(&self, child: &mut Child) -> Result<ExitStatus, SandboxError> {
        signal_group(child, Signal::SIGTERM);

        let grace_deadline = Instant::now() + self.grace_period;
        let mut exited = None;
        while Instant::now() < grace_deadline {
            if let Some(status) = child.try_wait().map_err(SandboxError::supervision)? {
                exited = Some(status);
                break;
            }
            thread::sleep(self.poll_interval);
        }

        // Stragglers in the group die even when the leader exited on SIGTERM.
        signal_group(child, Signal::SIGKILL);
        match exited {
            Some(status) => Ok(status),
            None => child.wait().map_err(SandboxError::supervision),
        }
    }
}

/// Sends `signal` to the child's process group, falling back to the child
/// alone when its pid does not fit a process-group id.
pub(crate) fn signal_group(child: &mut Child, signal: Signal) {
    let Ok(raw) = i32::try_from(child.id()) else {
        if let Err(error) = child.kill() {
            debug!(target: WATCHDOG_TARGET, %error, "kill failed");
        }
        return;
    };
    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(errno) => {
            let error = io::Error::from(errno);
            warn!(target: WATCHDOG_TARGET, %error, ?signal, "failed to signal process group");
        }
    }
}
