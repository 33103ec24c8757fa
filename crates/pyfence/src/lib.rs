//! Sandboxed execution of untrusted Python snippets.
//!
//! [`Engine`] ties the pipeline together: a snippet is length-checked,
//! scanned for forbidden text, parsed and walked by the static vetter, and
//! only then handed to a [`Supervisor`] that runs it in a confined child
//! interpreter. Whatever happens, the caller gets one [`ExecutionOutcome`].
//!
//! ```rust,no_run
//! use pyfence::{Engine, FailureKind};
//! use pyfence_config::Config;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), pyfence::EngineError> {
//! let engine = Engine::from_config(&Config::default())?;
//!
//! assert_eq!(engine.execute("2 + 3 * 4").result_value(), Some("14"));
//! assert_eq!(
//!     engine.execute("eval('2+2')").failure_kind(),
//!     Some(FailureKind::PolicyViolation)
//! );
//! assert!(engine.run_test_case("print(test_input * 2)", json!(5), "10").passed);
//! # Ok(()) }
//! ```

mod capture;
mod cli;
mod engine;
mod error;
mod outcome;
mod request;
pub mod telemetry;
mod validation;

pub use capture::{ResultCapturer, truncate_utf8};
pub use cli::run;
pub use engine::Engine;
pub use error::EngineError;
pub use outcome::{ExecutionOutcome, FailureKind};
pub use pyfence_sandbox::{ExecutionType, ResourceLimits, Supervisor};
pub use request::{ExecutionRequest, INPUT_DATA_NAME, TEST_INPUT_NAME};
pub use validation::{TestCase, TestCaseResult, ValidationReport};

#[cfg(test)]
mod tests;
