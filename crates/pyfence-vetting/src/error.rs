//! Error types for the vetting pipeline.
//!
//! These errors describe failures of the vetting machinery itself. A snippet
//! that breaks the policy is not an error; it produces a rejecting
//! [`SafetyVerdict`](crate::SafetyVerdict).

use thiserror::Error;

/// Failures raised while preparing or running the syntax parser.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VetError {
    /// The Tree-sitter parser refused the Python grammar.
    #[error("failed to initialise the Python parser: {message}")]
    ParserInit {
        /// Description of the failure.
        message: String,
    },

    /// The parser returned no tree at all.
    #[error("parser produced no syntax tree")]
    NoTree,
}

impl VetError {
    /// Creates a parser initialisation error.
    pub fn parser_init(message: impl Into<String>) -> Self {
        Self::ParserInit {
            message: message.into(),
        }
    }
}
