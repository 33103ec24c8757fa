//! Textual pre-filter run before any parsing.

use crate::policy::FORBIDDEN_PATTERNS;
use crate::verdict::{Violation, ViolationKind};

/// Case-insensitive substring scan over the raw snippet.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternScanner {
    max_code_length: usize,
}

impl PatternScanner {
    /// Creates a scanner that rejects snippets longer than
    /// `max_code_length` characters.
    #[must_use]
    pub const fn new(max_code_length: usize) -> Self {
        Self { max_code_length }
    }

    /// Checks the snippet length, then every forbidden pattern.
    ///
    /// # Errors
    ///
    /// Returns a [`Violation`] of kind `length-exceeded` or
    /// `forbidden-pattern` describing the first problem found.
    pub fn scan(&self, code: &str) -> Result<(), Violation> {
        self.check_length(code)?;

        let lowered = code.to_lowercase();
        match FORBIDDEN_PATTERNS
            .iter()
            .find(|pattern| lowered.contains(**pattern))
        {
            Some(pattern) => Err(Violation::new(
                ViolationKind::ForbiddenPattern,
                format!("forbidden pattern '{pattern}' detected"),
            )),
            None => Ok(()),
        }
    }

    /// Rejects snippets over the character limit without inspecting content.
    ///
    /// # Errors
    ///
    /// Returns a `length-exceeded` [`Violation`].
    pub fn check_length(&self, code: &str) -> Result<(), Violation> {
        if code.chars().nth(self.max_code_length).is_some() {
            return Err(Violation::new(
                ViolationKind::LengthExceeded,
                format!(
                    "code is {} characters long; the limit is {}",
                    code.chars().count(),
                    self.max_code_length
                ),
            ));
        }
        Ok(())
    }
}
