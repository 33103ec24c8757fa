//! Limits applied in the forked child before the interpreter is loaded.

use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use nix::sys::prctl;
use nix::sys::resource::{Resource, setrlimit};
use nix::sys::signal::Signal;

use crate::limits::{CHILD_OPEN_FILES, ResourceLimits};

/// Places the command in its own process group and installs the rlimit
/// hook.
pub(crate) fn confine(command: &mut Command, limits: &ResourceLimits) {
    let memory_bytes = limits.memory_bytes();
    let cpu_secs = limits.cpu_secs();
    command.process_group(0);
    // SAFETY: the hook runs between fork and exec and only issues prctl and
    // setrlimit system calls; it neither allocates nor takes locks.
    unsafe {
        command.pre_exec(move || apply_child_limits(memory_bytes, cpu_secs));
    }
}

fn apply_child_limits(memory_bytes: u64, cpu_secs: u64) -> io::Result<()> {
    prctl::set_pdeathsig(Signal::SIGKILL)?;
    prctl::set_no_new_privs()?;
    setrlimit(Resource::RLIMIT_AS, memory_bytes, memory_bytes)?;
    // The soft limit raises SIGXCPU; the hard limit one second later kills.
    setrlimit(Resource::RLIMIT_CPU, cpu_secs, cpu_secs.saturating_add(1))?;
    setrlimit(Resource::RLIMIT_FSIZE, 0, 0)?;
    setrlimit(Resource::RLIMIT_CORE, 0, 0)?;
    setrlimit(Resource::RLIMIT_NOFILE, CHILD_OPEN_FILES, CHILD_OPEN_FILES)?;
    setrlimit(Resource::RLIMIT_NPROC, 1, 1)?;
    Ok(())
}
