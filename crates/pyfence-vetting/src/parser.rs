//! Tree-sitter wrapper for the Python grammar.
//!
//! A fresh [`PythonParser`] is cheap to build, and `tree_sitter::Parser` is
//! not `Sync`, so the vetter creates one per call instead of sharing it.

use crate::error::VetError;

/// A parsed snippet together with its source text.
#[derive(Debug)]
pub struct ParsedSnippet<'src> {
    tree: tree_sitter::Tree,
    source: &'src str,
}

impl<'src> ParsedSnippet<'src> {
    /// Returns the root node of the syntax tree.
    #[must_use]
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Returns the source the tree was built from.
    #[must_use]
    pub const fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the first ERROR or MISSING node in document order.
    #[must_use]
    pub fn first_error(&self) -> Option<SyntaxErrorInfo> {
        first_error_node(self.tree.root_node()).map(SyntaxErrorInfo::from_node)
    }
}

/// Location of a syntax error, in one-based coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// One-based line number.
    pub line: u32,
    /// One-based column number.
    pub column: u32,
    /// Whether the parser inserted a missing token rather than skipping text.
    pub missing: bool,
}

impl SyntaxErrorInfo {
    fn from_node(node: tree_sitter::Node<'_>) -> Self {
        let (line, column) = point_to_one_based(node.start_position());
        Self {
            line,
            column,
            missing: node.is_missing(),
        }
    }
}

/// Parser configured for the Python grammar.
pub struct PythonParser {
    inner: tree_sitter::Parser,
}

impl PythonParser {
    /// Creates a parser with the Python grammar loaded.
    ///
    /// # Errors
    ///
    /// Returns [`VetError::ParserInit`] if the grammar's ABI is incompatible
    /// with the linked Tree-sitter runtime.
    pub fn new() -> Result<Self, VetError> {
        let mut inner = tree_sitter::Parser::new();
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        inner
            .set_language(&language)
            .map_err(|error| VetError::parser_init(error.to_string()))?;
        Ok(Self { inner })
    }

    /// Parses `source` into a tree. Syntax errors are represented in the
    /// tree, not returned as errors.
    ///
    /// # Errors
    ///
    /// Returns [`VetError::NoTree`] when Tree-sitter gives up entirely.
    pub fn parse<'src>(&mut self, source: &'src str) -> Result<ParsedSnippet<'src>, VetError> {
        let tree = self.inner.parse(source, None).ok_or(VetError::NoTree)?;
        Ok(ParsedSnippet { tree, source })
    }
}

fn first_error_node(root: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    if !root.has_error() {
        return None;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// Converts a Tree-sitter position (0-based) to one-based display coordinates.
fn point_to_one_based(pos: tree_sitter::Point) -> (u32, u32) {
    let line = u32::try_from(pos.row.saturating_add(1)).unwrap_or(u32::MAX);
    let column = u32::try_from(pos.column.saturating_add(1)).unwrap_or(u32::MAX);
    (line, column)
}
