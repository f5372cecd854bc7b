//! Lowering from tree-sitter C parse trees to the engine AST.
//!
//! Parsing happens fully in memory; the adapter tolerates comments,
//! preprocessor directives and parse errors inside function bodies by
//! skipping or lowering them to opaque statements.

use anyhow::{anyhow, Result};
use tree_sitter::{Node, Parser, Tree};

use super::types::{
    CaseLabel, Expr, ForInit, FunctionAst, Stmt, StmtKind, SwitchClause, VarDecl,
};

/// Node kinds that carry no program semantics and are skipped wholesale.
const SKIPPED_KINDS: &[&str] = &[
    "comment",
    "preproc_call",
    "preproc_def",
    "preproc_function_def",
    "preproc_if",
    "preproc_ifdef",
    "preproc_include",
];

/// Parses C-family source text into a tree-sitter tree.
pub fn parse_tree(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    let language = tree_sitter::Language::from(tree_sitter_c::LANGUAGE);
    parser
        .set_language(&language)
        .map_err(|e| anyhow!("failed to load C grammar: {e}"))?;
    parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("parser produced no tree"))
}

/// Collects every `function_definition` node reachable from `root` without
/// descending into function bodies (C has no nested functions; this only
/// skips redundant work under linkage/preprocessor wrappers).
#[must_use]
pub fn function_nodes(root: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "function_definition" {
            out.push(node);
            continue;
        }
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            stack.push(child);
        }
    }
    out.sort_by_key(tree_sitter::Node::start_byte);
    out
}

/// Parses `source` and lowers every function definition it contains.
pub fn parse_functions(source: &str) -> Result<Vec<FunctionAst>> {
    let tree = parse_tree(source)?;
    function_nodes(tree.root_node())
        .into_iter()
        .map(|node| lower_function(node, source))
        .collect()
}

/// Lowers one `function_definition` node.
pub fn lower_function(node: Node<'_>, source: &str) -> Result<FunctionAst> {
    let declarator = node
        .child_by_field_name("declarator")
        .ok_or_else(|| anyhow!("function definition without declarator"))?;
    let body = node
        .child_by_field_name("body")
        .ok_or_else(|| anyhow!("function definition without body"))?;

    let func_decl = find_function_declarator(declarator)
        .ok_or_else(|| anyhow!("function definition without parameter list"))?;
    let name = func_decl
        .child_by_field_name("declarator")
        .and_then(|d| declared_name(d, source))
        .ok_or_else(|| anyhow!("function definition without a name"))?;

    let return_ty = node
        .child_by_field_name("type")
        .map(|t| text(t, source))
        .unwrap_or_default();
    let signature = if return_ty.is_empty() {
        text(declarator, source).to_owned()
    } else {
        format!("{return_ty} {}", text(declarator, source))
    };

    let params = lower_params(func_decl, source);
    let line = line_of(node);
    let body = lower_stmt_list(body, source);

    Ok(FunctionAst {
        name,
        signature,
        params,
        body,
        line,
    })
}

/// Extracts the name of a function definition without lowering it; used to
/// label error records when lowering itself fails.
#[must_use]
pub(crate) fn function_name(node: Node<'_>, source: &str) -> Option<String> {
    let declarator = node.child_by_field_name("declarator")?;
    let func_decl = find_function_declarator(declarator)?;
    func_decl
        .child_by_field_name("declarator")
        .and_then(|d| declared_name(d, source))
}

fn find_function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "function_declarator" {
        return Some(node);
    }
    node.child_by_field_name("declarator")
        .and_then(find_function_declarator)
}

fn lower_params(func_decl: Node<'_>, source: &str) -> Vec<VarDecl> {
    let Some(params) = func_decl.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        if param.kind() != "parameter_declaration" {
            continue;
        }
        let ty = param
            .child_by_field_name("type")
            .map(|t| text(t, source).to_owned())
            .unwrap_or_default();
        let declarator = param.child_by_field_name("declarator");
        out.push(VarDecl {
            storage: specifier_texts(param, source),
            ty,
            name: declarator.and_then(|d| declared_name(d, source)),
            declarator: declarator.map(|d| text(d, source).to_owned()).unwrap_or_default(),
            init: None,
        });
    }
    out
}

/// Lowers the statements of a compound statement (or any node whose named
/// children are statements), skipping comments and preprocessor noise.
fn lower_stmt_list(node: Node<'_>, source: &str) -> Vec<Stmt> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        lower_into(child, source, &mut out);
    }
    out
}

fn lower_into(node: Node<'_>, source: &str, out: &mut Vec<Stmt>) {
    if SKIPPED_KINDS.contains(&node.kind()) {
        return;
    }
    // A declaration may carry several declarators; each becomes its own
    // statement so straight-line runs stay one-fragment-per-variable.
    if node.kind() == "declaration" {
        let line = line_of(node);
        for decl in lower_declaration(node, source) {
            out.push(Stmt {
                kind: StmtKind::Decl(decl),
                line,
            });
        }
        return;
    }
    out.push(lower_stmt(node, source));
}

fn lower_stmt(node: Node<'_>, source: &str) -> Stmt {
    let line = line_of(node);
    let kind = match node.kind() {
        "expression_statement" => match first_expr_child(node) {
            Some(expr) => StmtKind::Expr(lower_expr(expr, source)),
            None => StmtKind::Empty,
        },
        "if_statement" => StmtKind::If {
            cond: lower_condition(node, source),
            then_branch: node
                .child_by_field_name("consequence")
                .and_then(|b| lower_branch(b, source)),
            else_branch: node
                .child_by_field_name("alternative")
                .and_then(first_named)
                .and_then(|b| lower_branch(b, source)),
        },
        "while_statement" => StmtKind::While {
            cond: lower_condition(node, source),
            body: node
                .child_by_field_name("body")
                .and_then(|b| lower_branch(b, source)),
        },
        "do_statement" => StmtKind::DoWhile {
            cond: lower_condition(node, source),
            body: node
                .child_by_field_name("body")
                .and_then(|b| lower_branch(b, source)),
            cond_line: node.child_by_field_name("condition").and_then(line_of),
        },
        "for_statement" => StmtKind::For {
            init: lower_for_init(node, source),
            cond: node
                .child_by_field_name("condition")
                .map(|c| lower_expr(unwrap_parens(c), source)),
            step: node
                .child_by_field_name("update")
                .map(|u| lower_expr(u, source)),
            body: node
                .child_by_field_name("body")
                .and_then(|b| lower_branch(b, source)),
        },
        "switch_statement" => StmtKind::Switch {
            cond: lower_condition(node, source),
            clauses: lower_switch_clauses(node, source),
        },
        "break_statement" => StmtKind::Break,
        "continue_statement" => StmtKind::Continue,
        "return_statement" => StmtKind::Return(first_named(node).map(|e| lower_expr(e, source))),
        // goto, labels, nested bare blocks, inline asm, parse errors: the
        // opaque fallback keeps the graph connected without data flow.
        _ => StmtKind::Opaque,
    };
    Stmt { kind, line }
}

/// Normalizes a branch/body node to its statement list.
///
/// A compound statement contributes its children; any other single statement
/// becomes a one-element list. Empty bodies collapse to `None` so the
/// builder wires the branch straight to its fallthrough target.
fn lower_branch(node: Node<'_>, source: &str) -> Option<Vec<Stmt>> {
    let stmts = if node.kind() == "compound_statement" {
        lower_stmt_list(node, source)
    } else if SKIPPED_KINDS.contains(&node.kind()) {
        Vec::new()
    } else {
        let mut out = Vec::new();
        lower_into(node, source, &mut out);
        out
    };
    if stmts.is_empty() {
        None
    } else {
        Some(stmts)
    }
}

fn lower_condition(node: Node<'_>, source: &str) -> Expr {
    match node.child_by_field_name("condition") {
        Some(cond) => lower_expr(unwrap_parens(cond), source),
        None => Expr::Missing,
    }
}

fn lower_for_init(node: Node<'_>, source: &str) -> ForInit {
    let Some(init) = node.child_by_field_name("initializer") else {
        return ForInit::None;
    };
    if init.kind() == "declaration" {
        ForInit::Decls(lower_declaration(init, source))
    } else {
        ForInit::Expr(lower_expr(init, source))
    }
}

fn lower_switch_clauses(node: Node<'_>, source: &str) -> Vec<SwitchClause> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut clauses = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() != "case_statement" {
            continue;
        }
        let value = child.child_by_field_name("value");
        let label = match value {
            Some(v) => CaseLabel::Case(lower_expr(v, source)),
            None => CaseLabel::Default,
        };
        let mut body_stmts = Vec::new();
        let mut inner = child.walk();
        for stmt in child.named_children(&mut inner) {
            if value.is_some_and(|v| v.id() == stmt.id()) {
                continue;
            }
            lower_into(stmt, source, &mut body_stmts);
        }
        clauses.push(SwitchClause {
            label,
            body: body_stmts,
            line: line_of(child),
        });
    }
    clauses
}

/// Lowers one `declaration` node into a `VarDecl` per declarator.
fn lower_declaration(node: Node<'_>, source: &str) -> Vec<VarDecl> {
    let storage = specifier_texts(node, source);
    let ty = node
        .child_by_field_name("type")
        .map(|t| text(t, source).to_owned())
        .unwrap_or_default();
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        let (inner, init) = if declarator.kind() == "init_declarator" {
            let inner = declarator.child_by_field_name("declarator");
            let init = declarator
                .child_by_field_name("value")
                .map(|v| lower_expr(v, source));
            (inner, init)
        } else {
            (Some(declarator), None)
        };
        let Some(inner) = inner else { continue };
        out.push(VarDecl {
            storage: storage.clone(),
            ty: ty.clone(),
            name: declared_name(inner, source),
            declarator: text(inner, source).to_owned(),
            init,
        });
    }
    out
}

/// Storage classes and qualifiers preceding the type, in source order.
fn specifier_texts(node: Node<'_>, source: &str) -> Vec<String> {
    let type_id = node.child_by_field_name("type").map(|t| t.id());
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if Some(child.id()) == type_id {
            break;
        }
        if matches!(child.kind(), "storage_class_specifier" | "type_qualifier") {
            out.push(text(child, source).to_owned());
        }
    }
    out
}

/// Finds the identifier a declarator declares, descending through pointer,
/// array, function and parenthesized declarators.
fn declared_name(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() == "identifier" {
        return Some(text(node, source).to_owned());
    }
    if let Some(inner) = node.child_by_field_name("declarator") {
        return declared_name(inner, source);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| declared_name(child, source))
}

fn lower_expr(node: Node<'_>, source: &str) -> Expr {
    match node.kind() {
        "identifier" => Expr::Ident(text(node, source).to_owned()),
        "number_literal" | "string_literal" | "char_literal" | "concatenated_string"
        | "true" | "false" | "null" => Expr::Constant(text(node, source).to_owned()),
        "unary_expression" | "pointer_expression" => Expr::Unary {
            op: field_text(node, "operator", source),
            operand: Box::new(lower_field(node, "argument", source)),
            postfix: false,
        },
        "update_expression" => {
            let postfix = match (
                node.child_by_field_name("operator"),
                node.child_by_field_name("argument"),
            ) {
                (Some(op), Some(arg)) => op.start_byte() > arg.start_byte(),
                _ => false,
            };
            Expr::Unary {
                op: field_text(node, "operator", source),
                operand: Box::new(lower_field(node, "argument", source)),
                postfix,
            }
        }
        "binary_expression" => Expr::Binary {
            op: field_text(node, "operator", source),
            left: Box::new(lower_field(node, "left", source)),
            right: Box::new(lower_field(node, "right", source)),
        },
        "conditional_expression" => Expr::Ternary {
            cond: Box::new(lower_field(node, "condition", source)),
            then_expr: Box::new(lower_field(node, "consequence", source)),
            else_expr: Box::new(lower_field(node, "alternative", source)),
        },
        "assignment_expression" => Expr::Assign {
            op: field_text(node, "operator", source),
            target: Box::new(lower_field(node, "left", source)),
            value: Box::new(lower_field(node, "right", source)),
        },
        "subscript_expression" => Expr::Index {
            base: Box::new(lower_field(node, "argument", source)),
            index: Box::new(lower_field(node, "index", source)),
        },
        "call_expression" => {
            let args = match node.child_by_field_name("arguments") {
                Some(list) => {
                    let mut cursor = list.walk();
                    list.named_children(&mut cursor)
                        .filter(|c| !SKIPPED_KINDS.contains(&c.kind()))
                        .map(|c| lower_expr(c, source))
                        .collect()
                }
                None => Vec::new(),
            };
            Expr::Call {
                callee: Box::new(lower_field(node, "function", source)),
                args,
            }
        }
        "cast_expression" => Expr::Cast {
            ty: field_text(node, "type", source),
            operand: Box::new(lower_field(node, "value", source)),
        },
        "parenthesized_expression" => match first_named(node) {
            Some(inner) => lower_expr(inner, source),
            None => Expr::Missing,
        },
        "initializer_list" => {
            let mut cursor = node.walk();
            Expr::InitList(
                node.named_children(&mut cursor)
                    .filter(|c| !SKIPPED_KINDS.contains(&c.kind()))
                    .map(|c| lower_expr(c, source))
                    .collect(),
            )
        }
        "comma_expression" => {
            let mut parts = Vec::new();
            flatten_comma(node, source, &mut parts);
            Expr::Comma(parts)
        }
        "sizeof_expression" => match node.child_by_field_name("value") {
            Some(value) => Expr::Unary {
                op: "sizeof ".to_owned(),
                operand: Box::new(lower_expr(value, source)),
                postfix: false,
            },
            // sizeof(type) reads nothing; keep the spelled-out text.
            None => Expr::Constant(text(node, source).to_owned()),
        },
        _ => Expr::Opaque,
    }
}

fn flatten_comma(node: Node<'_>, source: &str, out: &mut Vec<Expr>) {
    let left = node.child_by_field_name("left");
    let right = node.child_by_field_name("right");
    match left {
        Some(l) => out.push(lower_expr(l, source)),
        None => out.push(Expr::Missing),
    }
    match right {
        Some(r) if r.kind() == "comma_expression" => flatten_comma(r, source, out),
        Some(r) => out.push(lower_expr(r, source)),
        None => out.push(Expr::Missing),
    }
}

fn lower_field(node: Node<'_>, field: &str, source: &str) -> Expr {
    match node.child_by_field_name(field) {
        Some(child) => lower_expr(child, source),
        None => Expr::Missing,
    }
}

fn field_text(node: Node<'_>, field: &str, source: &str) -> String {
    node.child_by_field_name(field)
        .map(|c| text(c, source).to_owned())
        .unwrap_or_default()
}

fn first_named(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| !SKIPPED_KINDS.contains(&c.kind()));
    found
}

fn first_expr_child(node: Node<'_>) -> Option<Node<'_>> {
    first_named(node)
}

fn unwrap_parens(node: Node<'_>) -> Node<'_> {
    if node.kind() == "parenthesized_expression" {
        if let Some(inner) = first_named(node) {
            return inner;
        }
    }
    node
}

fn text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

#[allow(clippy::needless_pass_by_value)]
fn line_of(node: Node<'_>) -> Option<usize> {
    Some(node.start_position().row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{Expr, ForInit, StmtKind};

    #[test]
    fn lowers_multi_declarator_declaration() {
        let funcs = parse_functions("void f() { int a = 1, b; }").unwrap();
        assert_eq!(funcs.len(), 1);
        let body = &funcs[0].body;
        assert_eq!(body.len(), 2);
        let StmtKind::Decl(a) = &body[0].kind else {
            panic!("expected decl, got {:?}", body[0].kind);
        };
        assert_eq!(a.name.as_deref(), Some("a"));
        assert_eq!(a.ty, "int");
        assert_eq!(a.init, Some(Expr::Constant("1".to_owned())));
        let StmtKind::Decl(b) = &body[1].kind else {
            panic!("expected decl, got {:?}", body[1].kind);
        };
        assert_eq!(b.name.as_deref(), Some("b"));
        assert!(b.init.is_none());
    }

    #[test]
    fn lowers_if_else_with_single_statement_branches() {
        let funcs = parse_functions("void f(int x) { if (x) x--; else x++; }").unwrap();
        let StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } = &funcs[0].body[0].kind
        else {
            panic!("expected if");
        };
        assert_eq!(*cond, Expr::Ident("x".to_owned()));
        assert_eq!(then_branch.as_ref().map(Vec::len), Some(1));
        assert_eq!(else_branch.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn empty_else_branch_collapses_to_none() {
        let funcs = parse_functions("void f(int x) { if (x) { x = 1; } else { } }").unwrap();
        let StmtKind::If { else_branch, .. } = &funcs[0].body[0].kind else {
            panic!("expected if");
        };
        assert!(else_branch.is_none());
    }

    #[test]
    fn extracts_params_and_signature() {
        let funcs = parse_functions("int main(int argc, char **argv) { return 0; }").unwrap();
        let f = &funcs[0];
        assert_eq!(f.name, "main");
        assert_eq!(f.signature, "int main(int argc, char **argv)");
        let names: Vec<_> = f.params.iter().filter_map(|p| p.name.as_deref()).collect();
        assert_eq!(names, vec!["argc", "argv"]);
        assert_eq!(f.line, Some(1));
    }

    #[test]
    fn for_with_declaration_initializer() {
        let funcs = parse_functions("void f(int n) { for (int i = 0; i < n; i++) { n--; } }")
            .unwrap();
        let StmtKind::For { init, cond, step, body } = &funcs[0].body[0].kind else {
            panic!("expected for");
        };
        let ForInit::Decls(decls) = init else {
            panic!("expected declaration initializer");
        };
        assert_eq!(decls[0].name.as_deref(), Some("i"));
        assert!(cond.is_some());
        assert!(step.is_some());
        assert_eq!(body.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn goto_lowers_to_opaque() {
        let funcs = parse_functions("void f() { goto done; done: return; }").unwrap();
        assert!(funcs[0]
            .body
            .iter()
            .any(|s| matches!(s.kind, StmtKind::Opaque)));
    }

    #[test]
    fn switch_clauses_keep_source_order() {
        let source = "void f(int x) { switch (x) { case 1: x = 2; break; default: x = 3; } }";
        let funcs = parse_functions(source).unwrap();
        let StmtKind::Switch { clauses, .. } = &funcs[0].body[0].kind else {
            panic!("expected switch");
        };
        assert_eq!(clauses.len(), 2);
        assert!(matches!(clauses[0].label, CaseLabel::Case(_)));
        assert!(matches!(clauses[1].label, CaseLabel::Default));
        assert_eq!(clauses[0].body.len(), 2);
    }
}
