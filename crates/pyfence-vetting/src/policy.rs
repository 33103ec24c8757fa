//! Constant denylists and the per-engine vetting policy.

/// Substrings rejected anywhere in the lowercased snippet text.
///
/// `compile(` is absent so that `re.compile` remains usable; bare `compile`
/// is caught by the tree walk instead.
pub const FORBIDDEN_PATTERNS: &[&str] = &[
    "__",
    "eval(",
    "exec(",
    "globals(",
    "locals(",
    "vars(",
    "getattr(",
    "setattr(",
    "delattr(",
    "hasattr(",
    "breakpoint(",
    "open(",
    "input(",
    "memoryview(",
    ".encode(",
    ".decode(",
    "chr(",
    "ord(",
    "bytes(",
    "bytearray(",
    "from_bytes",
    "to_bytes",
    ".format(",
    "format_map",
    "bin(",
    "hex(",
    "oct(",
    "base64",
    "binascii",
    "codecs",
    "subprocess",
    "ctypes",
    "importlib",
    "pickle",
    "marshal",
    "builtins",
    "os.system",
    "os.popen",
    "sys.modules",
    "\\x",
    // Matches both `\u` and `\U` after case folding.
    "\\u",
    "\\n{",
    "\\0",
    "\\1",
    "\\2",
    "\\3",
    "\\4",
    "\\5",
    "\\6",
    "\\7",
];

/// Names that may never be referenced, called or not.
pub const FORBIDDEN_CALLABLES: &[&str] = &[
    "eval",
    "exec",
    "compile",
    "__import__",
    "globals",
    "locals",
    "vars",
    "dir",
    "getattr",
    "setattr",
    "delattr",
    "hasattr",
    "open",
    "input",
    "breakpoint",
    "memoryview",
    "type",
    "object",
    "super",
    "help",
    "exit",
    "quit",
    "id",
    "classmethod",
    "staticmethod",
    "property",
];

/// Attribute names that expose interpreter internals or encoding escapes.
pub const REFLECTIVE_ATTRIBUTES: &[&str] = &[
    "mro",
    "f_globals",
    "f_locals",
    "f_back",
    "f_builtins",
    "f_code",
    "gi_frame",
    "gi_code",
    "gi_yieldfrom",
    "cr_frame",
    "cr_code",
    "cr_await",
    "ag_frame",
    "ag_code",
    "tb_frame",
    "tb_next",
    "co_code",
    "co_consts",
    "func_globals",
    "func_code",
    "format",
    "format_map",
    "encode",
    "decode",
    "fromhex",
    "to_bytes",
    "from_bytes",
    "vformat",
    "get_field",
    "Formatter",
];

/// Python hard keywords, which cannot be used as binding names.
pub(crate) const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Limits and allowlists applied by [`StaticVetter`](crate::StaticVetter).
///
/// The module allowlist is borrowed from the runtime descriptor so the vetter
/// and the child runtime cannot disagree about what may be imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VettingPolicy {
    max_code_length: usize,
    allowed_modules: &'static [&'static str],
}

impl VettingPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_code_length: usize, allowed_modules: &'static [&'static str]) -> Self {
        Self {
            max_code_length,
            allowed_modules,
        }
    }

    /// Longest accepted snippet, in characters.
    #[must_use]
    pub const fn max_code_length(&self) -> usize {
        self.max_code_length
    }

    /// Top-level modules that may be imported.
    #[must_use]
    pub const fn allowed_modules(&self) -> &'static [&'static str] {
        self.allowed_modules
    }

    /// Whether `name` is exactly an allowlisted module.
    #[must_use]
    pub fn allows_module(&self, name: &str) -> bool {
        self.allowed_modules.contains(&name)
    }
}
