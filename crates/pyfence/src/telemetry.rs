//! Structured telemetry initialisation for the `pyfence` binary.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use pyfence_config::{Config, LogFormat};
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression did not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// The tracing subscriber could not be installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first use.
///
/// Later calls return `Ok(())` without touching global state, so tests that
/// run the CLI repeatedly in one process keep working.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or another
/// subscriber is already installed.
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| ())
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    // Results go to stdout; events always go to stderr.
    let events = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339());
    let registry = Registry::default().with(filter);

    match config.log_format() {
        LogFormat::Json => install(registry.with(events.json().flatten_event(true))),
        LogFormat::Compact => install(
            registry.with(events.compact().with_ansi(io::stderr().is_terminal())),
        ),
    }
}

fn install<S>(subscriber: S) -> Result<(), TelemetryError>
where
    S: Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
