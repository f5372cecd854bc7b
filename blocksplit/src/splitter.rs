//! Simplified syntax-only block splitter.
//!
//! Walks the raw tree-sitter tree without building a graph: control
//! constructs anchor their own start line, runs of consecutive plain
//! statements anchor the run's first line. Used as the degraded fallback
//! when the full graph build fails for a function, and available standalone
//! for callers that only need coarse boundaries.

use anyhow::Result;
use tree_sitter::Node;

use crate::ast::{function_nodes, parse_tree};

/// Node kinds that open a block of their own.
const BLOCK_NODE_KINDS: &[&str] = &[
    "if_statement",
    "while_statement",
    "for_statement",
    "switch_statement",
    "case_statement",
    "return_statement",
    "break_statement",
    "continue_statement",
    "compound_statement",
    "do_statement",
    "else_clause",
];

/// Node kinds that never contribute a boundary.
const NOISE_KINDS: &[&str] = &[
    ";",
    "{",
    "}",
    "comment",
    "preproc_call",
    "preproc_def",
    "preproc_function_def",
    "preproc_if",
    "preproc_ifdef",
    "preproc_elif",
    "preproc_else",
    "preproc_include",
];

fn is_block_node(node: Node<'_>) -> bool {
    BLOCK_NODE_KINDS.contains(&node.kind())
}

fn is_meaningful(node: Node<'_>) -> bool {
    !NOISE_KINDS.contains(&node.kind())
}

/// Coarse split lines for every function body in `source`.
pub fn split_lines(source: &str) -> Result<Vec<usize>> {
    let tree = parse_tree(source)?;
    let mut lines = Vec::new();
    for func in function_nodes(tree.root_node()) {
        if let Some(body) = func.child_by_field_name("body") {
            collect_block_lines(body, &mut lines);
        }
    }
    lines.sort_unstable();
    lines.dedup();
    Ok(lines)
}

/// Collects boundary lines from one compound statement.
///
/// Control constructs emit their start line and recurse into nested bodies;
/// a maximal run of plain statements emits only its first line.
pub(crate) fn collect_block_lines(body: Node<'_>, lines: &mut Vec<usize>) {
    if body.kind() != "compound_statement" {
        return;
    }
    let mut cursor = body.walk();
    let children: Vec<Node<'_>> = body.children(&mut cursor).collect();
    let mut i = 0;
    while i < children.len() {
        let child = children[i];
        if matches!(child.kind(), "{" | "}") {
            i += 1;
            continue;
        }
        if is_block_node(child) {
            visit_block(child, lines);
            i += 1;
            continue;
        }
        let run_start = i;
        while i < children.len()
            && !is_block_node(children[i])
            && is_meaningful(children[i])
            && !matches!(children[i].kind(), "{" | "}")
        {
            i += 1;
        }
        if run_start < i {
            lines.push(children[run_start].start_position().row + 1);
        } else {
            i += 1;
        }
    }
}

fn visit_block(node: Node<'_>, lines: &mut Vec<usize>) {
    lines.push(node.start_position().row + 1);
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    for child in children {
        if child.kind() == "compound_statement" {
            collect_block_lines(child, lines);
        } else if is_block_node(child) {
            visit_block(child, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_headers_and_runs_anchor() {
        let source = "int f(int x) {\n    int y = 0;\n    y++;\n    if (x) {\n        y = 1;\n    }\n    return y;\n}\n";
        let lines = split_lines(source).unwrap();
        // Run starts at 2 (3 merges in), if at 4, its body at 5, return at 7.
        assert_eq!(lines, vec![2, 4, 5, 7]);
    }

    #[test]
    fn else_clause_is_its_own_anchor() {
        let source =
            "int f(int x) {\n    if (x) {\n        x = 1;\n    } else {\n        x = 2;\n    }\n}\n";
        let lines = split_lines(source).unwrap();
        assert!(lines.contains(&4), "else line missing from {lines:?}");
        assert!(lines.contains(&5), "else body line missing from {lines:?}");
    }

    #[test]
    fn comments_split_adjacent_runs_without_anchoring() {
        let source = "void f() {\n    int a = 1;\n    /* note */\n    int b = 2;\n}\n";
        let lines = split_lines(source).unwrap();
        // The comment itself never anchors, but it ends the first run.
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn source_without_functions_yields_nothing() {
        let lines = split_lines("int x = 3;\n").unwrap();
        assert!(lines.is_empty());
    }
}
