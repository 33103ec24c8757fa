//! Rule walk over the parsed syntax tree.
//!
//! The walk is iterative and visits nodes in document order, so the first
//! violation reported is the first one a reader would see.

use tree_sitter::Node;

use crate::policy::{FORBIDDEN_CALLABLES, REFLECTIVE_ATTRIBUTES, VettingPolicy};
use crate::verdict::{Violation, ViolationKind};

const DEFINITION_KINDS: &[&str] = &[
    "function_definition",
    "class_definition",
    "decorated_definition",
];

const STATEMENT_KINDS: &[&str] = &[
    "global_statement",
    "nonlocal_statement",
    "exec_statement",
    "future_import_statement",
    "type_alias_statement",
    "yield",
    "await",
];

/// Node kinds the walk descends into. Anything else is rejected.
const PERMITTED_KINDS: &[&str] = &[
    // statements
    "module",
    "block",
    "expression_statement",
    "assignment",
    "augmented_assignment",
    "if_statement",
    "elif_clause",
    "else_clause",
    "for_statement",
    "while_statement",
    "break_statement",
    "continue_statement",
    "pass_statement",
    "return_statement",
    "raise_statement",
    "assert_statement",
    "delete_statement",
    "try_statement",
    "except_clause",
    "finally_clause",
    "with_statement",
    "with_clause",
    "with_item",
    "as_pattern",
    "as_pattern_target",
    // expressions
    "binary_operator",
    "unary_operator",
    "boolean_operator",
    "not_operator",
    "comparison_operator",
    "conditional_expression",
    "named_expression",
    "parenthesized_expression",
    "call",
    "argument_list",
    "keyword_argument",
    "attribute",
    "subscript",
    "slice",
    "lambda",
    "lambda_parameters",
    "default_parameter",
    "keyword_separator",
    "positional_separator",
    "list_splat",
    "dictionary_splat",
    "list_splat_pattern",
    "dictionary_splat_pattern",
    "expression_list",
    "pattern_list",
    "tuple_pattern",
    "list_pattern",
    "type",
    // displays and comprehensions
    "list",
    "tuple",
    "set",
    "dictionary",
    "pair",
    "list_comprehension",
    "set_comprehension",
    "dictionary_comprehension",
    "generator_expression",
    "for_in_clause",
    "if_clause",
    // literals
    "integer",
    "float",
    "true",
    "false",
    "none",
    "ellipsis",
    "string",
    "concatenated_string",
    "string_content",
    "string_end",
    "interpolation",
    "escape_interpolation",
    "format_specifier",
    "format_expression",
    "type_conversion",
    "line_continuation",
];

/// How an identifier is being used by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Plain,
    CallTarget,
    AttributeName,
    KeywordName,
}

pub(crate) struct TreeWalker<'a> {
    policy: &'a VettingPolicy,
    source: &'a str,
}

impl<'a> TreeWalker<'a> {
    pub(crate) const fn new(policy: &'a VettingPolicy, source: &'a str) -> Self {
        Self { policy, source }
    }

    pub(crate) fn walk(&self, root: Node<'_>) -> Result<(), Violation> {
        let mut stack = vec![(root, Role::Plain)];
        while let Some((node, role)) = stack.pop() {
            if !self.visit(node, role)? {
                continue;
            }
            let mut children = Vec::new();
            let mut cursor = node.walk();
            if cursor.goto_first_child() {
                loop {
                    children.push((cursor.node(), child_role(node.kind(), cursor.field_name())));
                    if !cursor.goto_next_sibling() {
                        break;
                    }
                }
            }
            stack.extend(children.into_iter().rev());
        }
        Ok(())
    }

    /// Checks one node. Returns whether its children should be visited.
    fn visit(&self, node: Node<'_>, role: Role) -> Result<bool, Violation> {
        if node.is_error() || node.is_missing() {
            return Err(violation(
                node,
                ViolationKind::MalformedSyntax,
                "unparseable construct",
            ));
        }
        if !node.is_named() {
            return Ok(false);
        }

        let kind = node.kind();
        if DEFINITION_KINDS.contains(&kind) {
            return Err(violation(
                node,
                ViolationKind::DisallowedDefinition,
                "function and class definitions are not permitted",
            ));
        }
        if STATEMENT_KINDS.contains(&kind) {
            let label = kind.trim_end_matches("_statement").replace('_', " ");
            return Err(violation(
                node,
                ViolationKind::DisallowedStatement,
                &format!("'{label}' is not permitted"),
            ));
        }

        match kind {
            "comment" => Ok(false),
            "import_statement" => self.check_import(node).map(|()| false),
            "import_from_statement" => self.check_import_from(node).map(|()| false),
            "identifier" | "keyword_identifier" => {
                self.check_identifier(node, role).map(|()| false)
            }
            "string_start" => self.check_string_prefix(node).map(|()| false),
            "escape_sequence" => self.check_escape(node).map(|()| false),
            _ if PERMITTED_KINDS.contains(&kind) => Ok(true),
            _ => Err(violation(
                node,
                ViolationKind::DisallowedStatement,
                &format!("construct '{}' is not permitted", kind.replace('_', " ")),
            )),
        }
    }

    fn check_identifier(&self, node: Node<'_>, role: Role) -> Result<(), Violation> {
        let name = self.text(node);
        // The interpreter NFKC-folds identifiers, so `ｅval` would run as `eval`.
        if !name.is_ascii() {
            return Err(violation(
                node,
                ViolationKind::DisallowedName,
                &format!("non-ASCII identifier '{name}' is not permitted"),
            ));
        }
        match role {
            Role::AttributeName => {
                if name.starts_with('_') || REFLECTIVE_ATTRIBUTES.contains(&name) {
                    return Err(violation(
                        node,
                        ViolationKind::DisallowedAttribute,
                        &format!("access to attribute '{name}' is not permitted"),
                    ));
                }
                Ok(())
            }
            Role::KeywordName => check_dunder(node, name),
            Role::CallTarget if FORBIDDEN_CALLABLES.contains(&name) => Err(violation(
                node,
                ViolationKind::DisallowedCall,
                &format!("call to '{name}' is not permitted"),
            )),
            Role::Plain if FORBIDDEN_CALLABLES.contains(&name) => Err(violation(
                node,
                ViolationKind::DisallowedName,
                &format!("reference to '{name}' is not permitted"),
            )),
            Role::CallTarget | Role::Plain => check_dunder(node, name),
        }
    }

    fn check_import(&self, node: Node<'_>) -> Result<(), Violation> {
        let mut names = node.walk();
        for target in node.children_by_field_name("name", &mut names) {
            let module = match target.kind() {
                "aliased_import" => target
                    .child_by_field_name("name")
                    .map_or("", |name| self.text(name)),
                _ => self.text(target),
            };
            self.check_module(target, module)?;
        }
        Ok(())
    }

    fn check_import_from(&self, node: Node<'_>) -> Result<(), Violation> {
        let Some(module) = node.child_by_field_name("module_name") else {
            return Err(violation(
                node,
                ViolationKind::DisallowedImport,
                "import without a module name",
            ));
        };
        if module.kind() == "relative_import" {
            return Err(violation(
                module,
                ViolationKind::DisallowedImport,
                "relative imports are not permitted",
            ));
        }
        self.check_module(module, self.text(module))?;

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "wildcard_import" {
                return Err(violation(
                    child,
                    ViolationKind::DisallowedImport,
                    "wildcard imports are not permitted",
                ));
            }
        }

        let mut names = node.walk();
        for target in node.children_by_field_name("name", &mut names) {
            let imported = match target.kind() {
                "aliased_import" => target
                    .child_by_field_name("name")
                    .map_or("", |name| self.text(name)),
                _ => self.text(target),
            };
            if imported.starts_with('_')
                || !imported.is_ascii()
                || imported.contains('.')
                || REFLECTIVE_ATTRIBUTES.contains(&imported)
            {
                return Err(violation(
                    target,
                    ViolationKind::DisallowedImport,
                    &format!("importing '{imported}' is not permitted"),
                ));
            }
        }
        Ok(())
    }

    fn check_module(&self, node: Node<'_>, module: &str) -> Result<(), Violation> {
        if module.contains('.') {
            return Err(violation(
                node,
                ViolationKind::DisallowedImport,
                &format!("submodule import '{module}' is not permitted"),
            ));
        }
        if !self.policy.allows_module(module) {
            return Err(violation(
                node,
                ViolationKind::DisallowedImport,
                &format!("import of module '{module}' is not permitted"),
            ));
        }
        Ok(())
    }

    fn check_string_prefix(&self, node: Node<'_>) -> Result<(), Violation> {
        let prefix = self.text(node);
        if prefix.chars().any(|c| c.eq_ignore_ascii_case(&'b')) {
            return Err(violation(
                node,
                ViolationKind::DisallowedLiteral,
                "byte literals are not permitted",
            ));
        }
        Ok(())
    }

    fn check_escape(&self, node: Node<'_>) -> Result<(), Violation> {
        let escape = self.text(node);
        let smuggling = escape
            .chars()
            .nth(1)
            .is_some_and(|c| matches!(c, 'x' | 'u' | 'U' | 'N' | '0'..='7'));
        if smuggling {
            return Err(violation(
                node,
                ViolationKind::DisallowedLiteral,
                "character escape sequences are not permitted",
            ));
        }
        Ok(())
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

fn check_dunder(node: Node<'_>, name: &str) -> Result<(), Violation> {
    if name.starts_with("__") {
        return Err(violation(
            node,
            ViolationKind::DisallowedName,
            &format!("reference to '{name}' is not permitted"),
        ));
    }
    Ok(())
}

fn violation(node: Node<'_>, kind: ViolationKind, message: &str) -> Violation {
    let line = node.start_position().row.saturating_add(1);
    Violation::new(kind, format!("{message} (line {line})"))
}

fn child_role(parent_kind: &str, field: Option<&str>) -> Role {
    match (parent_kind, field) {
        ("attribute", Some("attribute")) => Role::AttributeName,
        ("keyword_argument", Some("name")) => Role::KeywordName,
        ("call", Some("function")) => Role::CallTarget,
        _ => Role::Plain,
    }
}
