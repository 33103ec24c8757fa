//! The full pre-execution pipeline: length, text scan, parse, tree walk.

use tracing::debug;

use crate::error::VetError;
use crate::parser::PythonParser;
use crate::policy::{PYTHON_KEYWORDS, VettingPolicy};
use crate::scanner::PatternScanner;
use crate::verdict::{SafetyVerdict, Violation, ViolationKind};
use crate::walker::TreeWalker;

/// Tracing target for vetting decisions.
const VETTING_TARGET: &str = "pyfence_vetting::vetter";

/// Decides whether a snippet may be executed.
///
/// The vetter holds no parser state and is `Sync`; each call builds its own
/// Tree-sitter parser.
#[derive(Debug, Clone, Copy)]
pub struct StaticVetter {
    policy: VettingPolicy,
    scanner: PatternScanner,
}

impl StaticVetter {
    /// Creates a vetter for the given policy.
    #[must_use]
    pub const fn new(policy: VettingPolicy) -> Self {
        Self {
            policy,
            scanner: PatternScanner::new(policy.max_code_length()),
        }
    }

    /// Returns the policy this vetter enforces.
    #[must_use]
    pub const fn policy(&self) -> &VettingPolicy {
        &self.policy
    }

    /// Vets a snippet, failing closed when the parser itself is unavailable.
    #[must_use]
    pub fn vet(&self, code: &str) -> SafetyVerdict {
        let verdict = match self.try_vet(code) {
            Ok(result) => SafetyVerdict::from(result),
            Err(error) => {
                debug!(target: VETTING_TARGET, %error, "parser unavailable");
                SafetyVerdict::reject(ViolationKind::MalformedSyntax, "snippet could not be parsed")
            }
        };

        if let Some(kind) = verdict.violation_kind() {
            debug!(
                target: VETTING_TARGET,
                violation = %kind,
                detail = verdict.detail().unwrap_or_default(),
                "snippet rejected"
            );
        }
        verdict
    }

    /// Runs the pipeline, separating policy violations from parser faults.
    ///
    /// # Errors
    ///
    /// Returns [`VetError`] when the parser cannot be built or produces no
    /// tree. Policy violations are reported in the `Ok` value.
    pub fn try_vet(&self, code: &str) -> Result<Result<(), Violation>, VetError> {
        if let Err(violation) = self.scanner.scan(code) {
            return Ok(Err(violation));
        }

        let mut parser = PythonParser::new()?;
        let parsed = parser.parse(code)?;
        if let Some(error) = parsed.first_error() {
            let what = if error.missing {
                "incomplete statement"
            } else {
                "syntax error"
            };
            return Ok(Err(Violation::new(
                ViolationKind::MalformedSyntax,
                format!("{what} at line {}, column {}", error.line, error.column),
            )));
        }

        Ok(TreeWalker::new(&self.policy, parsed.source()).walk(parsed.root_node()))
    }

    /// Checks a name that will be bound as a variable in the child runtime.
    ///
    /// Names must be plain ASCII identifiers, must not start with an
    /// underscore, must not be a keyword, and must not shadow any entry in
    /// `reserved`.
    #[must_use]
    pub fn vet_binding_name(&self, name: &str, reserved: &[&str]) -> SafetyVerdict {
        let mut chars = name.chars();
        let well_formed = chars
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !well_formed {
            return SafetyVerdict::reject(
                ViolationKind::DisallowedName,
                format!("'{name}' is not a valid variable name"),
            );
        }
        if PYTHON_KEYWORDS.contains(&name) || reserved.contains(&name) {
            return SafetyVerdict::reject(
                ViolationKind::DisallowedName,
                format!("'{name}' is reserved"),
            );
        }
        if self.policy.allows_module(name) {
            return SafetyVerdict::reject(
                ViolationKind::DisallowedName,
                format!("'{name}' would shadow an importable module"),
            );
        }
        SafetyVerdict::allow()
    }
}
