//! Static vetting of untrusted Python snippets.
//!
//! Every snippet passes through three gates before it may run:
//!
//! 1. a character-length limit,
//! 2. a case-insensitive substring scan ([`PatternScanner`]) for reflective
//!    keywords, escape idioms and dangerous module names,
//! 3. a walk over the Tree-sitter syntax tree ([`StaticVetter`]) that rejects
//!    imports outside the allowlist, dynamic-execution callables, private or
//!    reflective attributes, definitions, and smuggling literals.
//!
//! The outcome is a [`SafetyVerdict`]. Vetting never executes code and never
//! spawns processes.
//!
//! ```
//! use pyfence_vetting::{StaticVetter, VettingPolicy, ViolationKind};
//!
//! let vetter = StaticVetter::new(VettingPolicy::new(2000, &["math"]));
//! assert!(vetter.vet("import math\nmath.sqrt(16)").allowed());
//!
//! let verdict = vetter.vet("import os");
//! assert_eq!(verdict.violation_kind(), Some(ViolationKind::DisallowedImport));
//! ```

mod error;
mod parser;
mod policy;
mod scanner;
mod verdict;
mod vetter;
mod walker;

pub use error::VetError;
pub use parser::{ParsedSnippet, PythonParser, SyntaxErrorInfo};
pub use policy::{FORBIDDEN_CALLABLES, FORBIDDEN_PATTERNS, REFLECTIVE_ATTRIBUTES, VettingPolicy};
pub use scanner::PatternScanner;
pub use verdict::{SafetyVerdict, Violation, ViolationKind};
pub use vetter::StaticVetter;

#[cfg(test)]
mod tests;
