//! The restricted runtime visible to executed snippets.

use serde::Serialize;

const STANDARD_BUILTINS: &[&str] = &[
    "abs",
    "all",
    "any",
    "bool",
    "dict",
    "divmod",
    "enumerate",
    "filter",
    "float",
    "frozenset",
    "int",
    "isinstance",
    "len",
    "list",
    "map",
    "max",
    "min",
    "pow",
    "print",
    "range",
    "reversed",
    "round",
    "set",
    "sorted",
    "str",
    "sum",
    "tuple",
    "zip",
];

const STANDARD_EXCEPTIONS: &[&str] = &[
    "Exception",
    "ArithmeticError",
    "AssertionError",
    "IndexError",
    "KeyError",
    "LookupError",
    "OverflowError",
    "RuntimeError",
    "StopIteration",
    "TypeError",
    "ValueError",
    "ZeroDivisionError",
];

const STANDARD_MODULES: &[&str] = &[
    "math",
    "random",
    "datetime",
    "time",
    "json",
    "re",
    "string",
    "itertools",
    "statistics",
];

/// Names bound by the engine for test-case input.
pub const INPUT_BINDINGS: &[&str] = &["test_input", "input_data"];

/// Immutable description of the builtins and modules a snippet may use.
///
/// The descriptor is serialised verbatim into every child request. Nothing
/// in a request can widen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeDescriptor {
    builtins: &'static [&'static str],
    exceptions: &'static [&'static str],
    modules: &'static [&'static str],
}

impl RuntimeDescriptor {
    /// The standard numeric and text-processing runtime.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            builtins: STANDARD_BUILTINS,
            exceptions: STANDARD_EXCEPTIONS,
            modules: STANDARD_MODULES,
        }
    }

    /// Builtin callables exposed to snippets.
    #[must_use]
    pub const fn builtins(&self) -> &'static [&'static str] {
        self.builtins
    }

    /// Exception classes exposed so snippets can raise and catch errors.
    #[must_use]
    pub const fn exceptions(&self) -> &'static [&'static str] {
        self.exceptions
    }

    /// Modules that may be imported.
    #[must_use]
    pub const fn modules(&self) -> &'static [&'static str] {
        self.modules
    }

    /// Names that caller-supplied variables may not shadow.
    #[must_use]
    pub fn reserved_names(&self) -> Vec<&'static str> {
        self.builtins
            .iter()
            .chain(self.exceptions)
            .chain(self.modules)
            .chain(INPUT_BINDINGS)
            .copied()
            .collect()
    }
}

impl Default for RuntimeDescriptor {
    fn default() -> Self {
        Self::standard()
    }
}
