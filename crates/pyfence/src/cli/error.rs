//! Errors raised by the command-line runtime.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::error::EngineError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    Usage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to start the execution engine: {0}")]
    Engine(#[from] EngineError),
    #[error("failed to read snippet from {path}: {source}")]
    ReadSource { path: String, source: io::Error },
    #[error("failed to read test cases from {path}: {source}")]
    ReadCases { path: Utf8PathBuf, source: io::Error },
    #[error("test cases must be a JSON array of {{input, expected}} objects: {0}")]
    ParseCases(serde_json::Error),
    #[error("--input must be valid JSON: {0}")]
    ParseInput(serde_json::Error),
    #[error("failed to serialise result: {0}")]
    Serialise(serde_json::Error),
    #[error("failed to write result: {0}")]
    Emit(io::Error),
}
