//! Line propagation, split-line extraction and DOT rendering.

use std::collections::BTreeSet;

use anyhow::{anyhow, Result};
use rustc_hash::FxHashSet;

use super::types::{FlowGraph, FlowNode};

/// Fills missing line numbers bottom-up.
///
/// A node with at least one native line keeps it; a node with none (branch
/// containers, loop wrappers) takes the minimum line among its descendants
/// as a single anchor. Returns the node's minimum line after the fill.
pub(super) fn propagate_lines(node: &mut FlowNode) -> Option<usize> {
    let mut child_min: Option<usize> = None;
    for child in &mut node.children {
        if let Some(line) = propagate_lines(child) {
            child_min = Some(child_min.map_or(line, |m| m.min(line)));
        }
    }
    if node.line_numbers.is_empty() {
        if let Some(line) = child_min {
            node.line_numbers.push(line);
        }
    }
    node.line_numbers.iter().copied().min()
}

impl FlowGraph {
    /// Parses `source` and builds the graph of the function named `name`.
    pub fn from_source(source: &str, name: &str) -> Result<Self> {
        let functions = crate::ast::parse_functions(source)?;
        let func = functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| anyhow!("no function named `{name}` in source"))?;
        Self::from_function(func)
    }

    /// The sorted, deduplicated set of block boundary lines.
    ///
    /// Traversal follows ownership (`children`), never `successors`, so
    /// cyclic back-edges cannot loop it; real nodes are visited once by id.
    /// The synthetic entry and exit contribute nothing: the function
    /// signature line is not a block boundary.
    #[must_use]
    pub fn split_lines(&self) -> Vec<usize> {
        let mut seen = FxHashSet::default();
        let mut lines = BTreeSet::new();
        collect_lines(&self.root, &mut seen, &mut lines);
        lines.into_iter().collect()
    }

    /// Renders the graph in Graphviz DOT format.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph {\n");
        out.push_str("  rankdir=TB;\n");
        let mut seen = FxHashSet::default();
        render_node(&self.root, &mut seen, &mut out);
        out.push_str("}\n");
        out
    }
}

fn collect_lines(node: &FlowNode, seen: &mut FxHashSet<usize>, lines: &mut BTreeSet<usize>) {
    if let Some(id) = node.id {
        if !seen.insert(id) {
            return;
        }
        if !node.is_entry && !node.is_exit {
            lines.extend(node.line_numbers.iter().copied());
        }
    }
    for child in &node.children {
        collect_lines(child, seen, lines);
    }
}

fn render_node(node: &FlowNode, seen: &mut FxHashSet<usize>, out: &mut String) {
    let Some(id) = node.id else {
        for child in &node.children {
            render_node(child, seen, out);
        }
        return;
    };
    if !seen.insert(id) {
        return;
    }

    let label = node
        .code
        .iter()
        .map(|line| line.replace('\\', "\\\\").replace('"', "\\\""))
        .collect::<Vec<_>>()
        .join("\\n");
    let shape = if node.is_entry {
        "doublecircle"
    } else if node.is_exit {
        "box"
    } else {
        "ellipse"
    };
    out.push_str(&format!("  n{id} [label=\"{label}\", shape={shape}];\n"));

    // An if header owns exactly two anonymous branch containers and carries
    // one edge per branch, labelled by outcome.
    let branching = node.successors.len() == 2
        && node.children.len() == 2
        && node.children.first().is_some_and(|c| c.id.is_none());
    for (idx, succ) in node.successors.iter().enumerate() {
        if branching {
            let outcome = if idx == 0 { "True" } else { "False" };
            out.push_str(&format!("  n{id} -> n{succ} [label=\"{outcome}\"];\n"));
        } else {
            out.push_str(&format!("  n{id} -> n{succ};\n"));
        }
    }
    for child in &node.children {
        render_node(child, seen, out);
    }
}
