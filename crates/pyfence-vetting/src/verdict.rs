//! The result of vetting a snippet.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Category of policy breach that caused a rejection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ViolationKind {
    /// The raw text contained a denylisted substring.
    ForbiddenPattern,
    /// An import named a module outside the allowlist.
    DisallowedImport,
    /// A dynamic-execution or reflective callable was invoked.
    DisallowedCall,
    /// An attribute access reached a private or reflective member.
    DisallowedAttribute,
    /// A function, class or decorated definition was present.
    DisallowedDefinition,
    /// The snippet exceeded the configured character limit.
    LengthExceeded,
    /// A reflective or reserved name was referenced.
    DisallowedName,
    /// A statement outside the permitted subset was present.
    DisallowedStatement,
    /// A byte literal or smuggling escape sequence was present.
    DisallowedLiteral,
    /// The snippet did not parse.
    MalformedSyntax,
}

/// Immutable outcome of the vetting pipeline for one snippet.
///
/// `allowed` is true exactly when `violation_kind` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyVerdict {
    allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    violation_kind: Option<ViolationKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl SafetyVerdict {
    /// A verdict permitting execution.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            violation_kind: None,
            detail: None,
        }
    }

    /// A verdict rejecting the snippet.
    #[must_use]
    pub fn reject(kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            allowed: false,
            violation_kind: Some(kind),
            detail: Some(detail.into()),
        }
    }

    /// Whether execution may proceed.
    #[must_use]
    pub const fn allowed(&self) -> bool {
        self.allowed
    }

    /// The violation category, when rejected.
    #[must_use]
    pub const fn violation_kind(&self) -> Option<ViolationKind> {
        self.violation_kind
    }

    /// Human-readable reason, when rejected.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// A single policy breach found by the scanner or the vetter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    kind: ViolationKind,
    detail: String,
}

impl Violation {
    /// Creates a violation of the given kind.
    pub fn new(kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// The violation category.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        self.kind
    }

    /// Human-readable reason.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<Violation> for SafetyVerdict {
    fn from(violation: Violation) -> Self {
        Self {
            allowed: false,
            violation_kind: Some(violation.kind),
            detail: Some(violation.detail),
        }
    }
}

impl From<Result<(), Violation>> for SafetyVerdict {
    fn from(result: Result<(), Violation>) -> Self {
        result.map_or_else(Self::from, |()| Self::allow())
    }
}
