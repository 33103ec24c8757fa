//! Shared helpers for tests that need a real interpreter.

use std::env;

use camino::Utf8PathBuf;

use pyfence_sandbox::{ProcessSupervisor, RuntimeDescriptor};

const WELL_KNOWN: &[&str] = &["/usr/bin/python3", "/usr/local/bin/python3", "/bin/python3"];

/// Locates a Python 3 interpreter, preferring well-known system paths.
pub fn python3() -> Option<Utf8PathBuf> {
    let well_known = WELL_KNOWN
        .iter()
        .map(Utf8PathBuf::from)
        .find(|path| path.exists());
    well_known.or_else(|| {
        let path = env::var_os("PATH")?;
        env::split_paths(&path)
            .map(|dir| dir.join("python3"))
            .find(|candidate| candidate.is_file())
            .and_then(|candidate| Utf8PathBuf::from_path_buf(candidate).ok())
            .filter(|candidate| candidate.is_absolute())
    })
}

/// Builds a supervisor for the standard runtime, or `None` when no
/// interpreter is installed and the calling test should be skipped.
pub fn supervisor() -> Option<ProcessSupervisor> {
    let interpreter = python3()?;
    Some(
        ProcessSupervisor::new(interpreter, RuntimeDescriptor::standard())
            .expect("supervisor should start with a valid interpreter"),
    )
}
