//! Back-to-front graph construction.
//!
//! Statements are scanned in reverse source order so every statement knows
//! the id of the node that executes after it before its own node exists.
//! Consecutive plain statements (declarations, expression statements) merge
//! into one block node; each control construct gets a header node plus
//! recursively built child blocks.

use anyhow::{bail, Result};
use rustc_hash::FxHashSet;

use crate::ast::{CaseLabel, ForInit, FunctionAst, Stmt, StmtKind};

use super::dupath::DuPaths;
use super::expr::{render_decl, render_expr, render_stmt_expr};
use super::types::{FlowGraph, FlowNode};

/// Fallthrough and jump targets threaded through a block build.
#[derive(Debug, Clone, Copy)]
struct Targets {
    /// Where control goes after the block's last statement.
    end: usize,
    /// Where `break` jumps; `None` outside loops and switches.
    break_to: Option<usize>,
    /// Where `return` jumps (always the function exit node).
    return_to: usize,
    /// Where `continue` jumps; `None` outside loops.
    continue_to: Option<usize>,
}

/// Allocates node ids and builds one [`FlowGraph`] per function.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    next_id: usize,
}

impl GraphBuilder {
    fn alloc(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Builds the graph and definition-use index of one function.
    ///
    /// Ids restart at zero per function: the entry node is always 0 and the
    /// exit node always 1, so repeated builds of the same function produce
    /// identical graphs.
    pub fn build_function(&mut self, func: &FunctionAst) -> Result<FlowGraph> {
        self.next_id = 0;
        let entry_id = self.alloc();
        let exit_id = self.alloc();

        let targets = Targets {
            end: exit_id,
            break_to: None,
            return_to: exit_id,
            continue_to: None,
        };
        let (nodes, body_entry, body_du) = self.build_block(&func.body, targets)?;

        let mut entry = FlowNode::new(entry_id);
        entry.code.push("Start".to_owned());
        entry.code.push(func.signature.clone());
        entry.is_entry = true;
        entry.defines = func.params.iter().filter_map(|p| p.name.clone()).collect();
        if let Some(line) = func.line {
            entry.line_numbers.push(line);
        }
        entry.successors.push(body_entry);
        entry.children = nodes;

        let mut exit = FlowNode::new(exit_id);
        exit.code.push("End".to_owned());
        exit.is_exit = true;
        entry.children.push(exit);

        let du = DuPaths::from_node(entry_id, &entry.defines, &[]).then(body_du);
        Ok(FlowGraph {
            name: func.name.clone(),
            root: entry,
            du,
        })
    }

    /// Builds the nodes of one statement list.
    ///
    /// Returns `(nodes, entry_id, du)`: the block's top-level nodes in
    /// source order, the id control enters the block at, and the block's
    /// definition-use index. An empty list yields a single line-less
    /// placeholder node forwarding to the fallthrough target.
    fn build_block(
        &mut self,
        stmts: &[Stmt],
        t: Targets,
    ) -> Result<(Vec<FlowNode>, usize, DuPaths)> {
        let mut nodes: Vec<FlowNode> = Vec::new();
        let mut du = DuPaths::default();
        let mut end = t.end;
        let mut pending: Vec<&Stmt> = Vec::new();

        for stmt in stmts.iter().rev() {
            if matches!(
                stmt.kind,
                StmtKind::Decl(_) | StmtKind::Expr(_) | StmtKind::Empty | StmtKind::Opaque
            ) {
                pending.push(stmt);
                continue;
            }
            self.flush_run(&mut pending, &mut nodes, &mut du, &mut end);

            match &stmt.kind {
                StmtKind::If {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    let id = self.alloc();
                    let mut node = FlowNode::new(id);
                    let (text, uses) = render_expr(cond);
                    node.code.push(format!("if ({text})"));
                    node.uses = dedup(uses);
                    if let Some(line) = stmt.line {
                        node.line_numbers.push(line);
                    }
                    let cond_du = DuPaths::from_node(id, &[], &node.uses);

                    let mut arms = DuPaths::default();
                    for branch in [then_branch, else_branch] {
                        let mut container = FlowNode::container();
                        match branch {
                            Some(body) => {
                                let (bnodes, bentry, bdu) =
                                    self.build_block(body, Targets { end, ..t })?;
                                container.children = bnodes;
                                node.successors.push(bentry);
                                arms.push_clause(bdu);
                            }
                            None => {
                                // Empty branch: the header falls straight
                                // through, the container keeps a placeholder
                                // so both arms stay visible in the tree.
                                let pid = self.alloc();
                                let mut p = FlowNode::new(pid);
                                p.successors.push(end);
                                container.children.push(p);
                                node.successors.push(end);
                            }
                        }
                        node.children.push(container);
                    }
                    du = cond_du
                        .then(arms.into_alternative())
                        .then(std::mem::take(&mut du));
                    nodes.insert(0, node);
                    end = id;
                }
                StmtKind::While { cond, body } => {
                    let id = self.alloc();
                    let mut node = FlowNode::new(id);
                    let (text, uses) = render_expr(cond);
                    node.code.push(format!("while ({text})"));
                    node.uses = dedup(uses);
                    if let Some(line) = stmt.line {
                        node.line_numbers.push(line);
                    }
                    let cond_du = DuPaths::from_node(id, &[], &node.uses);

                    let body_targets = Targets {
                        end: id,
                        break_to: Some(end),
                        return_to: t.return_to,
                        continue_to: Some(id),
                    };
                    let (bnodes, bentry, bdu) =
                        self.build_block(body.as_deref().unwrap_or(&[]), body_targets)?;
                    node.successors = vec![bentry, end];
                    node.children = bnodes;

                    du = cond_du
                        .then(bdu.into_repetition())
                        .then(std::mem::take(&mut du));
                    nodes.insert(0, node);
                    end = id;
                }
                StmtKind::DoWhile {
                    cond,
                    body,
                    cond_line,
                } => {
                    let id = self.alloc();
                    let mut node = FlowNode::new(id);
                    let (text, uses) = render_expr(cond);
                    node.code.push(format!("do {{ ... }} while ({text})"));
                    node.uses = dedup(uses);
                    if let Some(line) = stmt.line {
                        node.line_numbers.push(line);
                    }
                    if let Some(line) = cond_line {
                        node.line_numbers.push(*line);
                    }
                    let cond_du = DuPaths::from_node(id, &[], &node.uses);

                    let body_targets = Targets {
                        end: id,
                        break_to: Some(end),
                        return_to: t.return_to,
                        continue_to: Some(id),
                    };
                    let (bnodes, bentry, bdu) =
                        self.build_block(body.as_deref().unwrap_or(&[]), body_targets)?;
                    node.successors = vec![bentry, end];
                    node.children = bnodes;

                    // Body first, condition second: the do-while condition
                    // only evaluates after an iteration.
                    du = bdu
                        .into_repetition()
                        .then(cond_du)
                        .then(std::mem::take(&mut du));
                    nodes.insert(0, node);
                    // Control enters at the body, not the condition.
                    end = bentry;
                }
                StmtKind::For {
                    init,
                    cond,
                    step,
                    body,
                } => {
                    let id = self.alloc();
                    let mut node = FlowNode::new(id);
                    let mut defines = Vec::new();
                    let mut uses = Vec::new();

                    let init_text = match init {
                        ForInit::Decls(decls) => {
                            let mut parts = Vec::with_capacity(decls.len());
                            for decl in decls {
                                let (text, decl_defines, decl_uses) = render_decl(decl);
                                parts.push(text);
                                defines.extend(decl_defines);
                                uses.extend(decl_uses);
                            }
                            parts.join(", ")
                        }
                        ForInit::Expr(expr) => {
                            let (et, ed, eu) = render_stmt_expr(expr);
                            defines.extend(ed);
                            uses.extend(eu);
                            et
                        }
                        ForInit::None => String::new(),
                    };
                    let cond_text = match cond {
                        Some(expr) => {
                            let (ct, cu) = render_expr(expr);
                            uses.extend(cu);
                            ct
                        }
                        None => String::new(),
                    };
                    let step_text = match step {
                        Some(expr) => {
                            let (st, su) = render_expr(expr);
                            uses.extend(su);
                            st
                        }
                        None => String::new(),
                    };
                    node.code
                        .push(format!("for ({init_text}; {cond_text}; {step_text})"));
                    node.defines = dedup(defines);
                    node.uses = dedup(uses);
                    if let Some(line) = stmt.line {
                        node.line_numbers.push(line);
                    }
                    let header_du = DuPaths::from_node(id, &node.defines, &node.uses);

                    let body_targets = Targets {
                        end: id,
                        break_to: Some(end),
                        return_to: t.return_to,
                        continue_to: Some(id),
                    };
                    let (bnodes, bentry, bdu) =
                        self.build_block(body.as_deref().unwrap_or(&[]), body_targets)?;
                    node.successors = vec![bentry, end];
                    node.children = bnodes;

                    du = header_du
                        .then(bdu.into_repetition())
                        .then(std::mem::take(&mut du));
                    nodes.insert(0, node);
                    end = id;
                }
                StmtKind::Switch { cond, clauses } => {
                    let id = self.alloc();
                    let mut node = FlowNode::new(id);
                    let (text, uses) = render_expr(cond);
                    node.code.push(format!("switch ({text})"));
                    node.uses = dedup(uses);
                    if let Some(line) = stmt.line {
                        node.line_numbers.push(line);
                    }
                    let cond_du = DuPaths::from_node(id, &[], &node.uses);

                    // Clauses build in reverse so each body knows the next
                    // clause's body entry as its fallthrough target.
                    let mut arms = DuPaths::default();
                    let mut clause_end = end;
                    for clause in clauses.iter().rev() {
                        let cid = self.alloc();
                        let mut cnode = FlowNode::new(cid);
                        let label_uses = match &clause.label {
                            CaseLabel::Case(expr) => {
                                let (lt, lu) = render_expr(expr);
                                cnode.code.push(format!("case {lt} :"));
                                dedup(lu)
                            }
                            CaseLabel::Default => {
                                cnode.code.push("default :".to_owned());
                                Vec::new()
                            }
                        };
                        cnode.uses = label_uses.clone();
                        if let Some(line) = clause.line {
                            cnode.line_numbers.push(line);
                        }
                        let label_du = DuPaths::from_node(cid, &[], &label_uses);

                        let body_targets = Targets {
                            end: clause_end,
                            break_to: Some(end),
                            return_to: t.return_to,
                            continue_to: t.continue_to,
                        };
                        let (bnodes, bentry, bdu) =
                            self.build_block(&clause.body, body_targets)?;
                        cnode.successors.push(bentry);
                        cnode.children = bnodes;

                        node.successors.insert(0, cid);
                        node.children.insert(0, cnode);
                        arms.push_clause_front(label_du.then(bdu));
                        clause_end = bentry;
                    }
                    if node.successors.is_empty() {
                        node.successors.push(end);
                    }

                    // Clause groups stay peers: unlike if/else arms they are
                    // not folded into a single alternative.
                    du = cond_du.then(arms).then(std::mem::take(&mut du));
                    nodes.insert(0, node);
                    end = id;
                }
                StmtKind::Break => {
                    let id = self.alloc();
                    let mut node = FlowNode::new(id);
                    node.code.push("break".to_owned());
                    if let Some(line) = stmt.line {
                        node.line_numbers.push(line);
                    }
                    node.successors.push(t.break_to.unwrap_or(end));
                    nodes.insert(0, node);
                    end = id;
                }
                StmtKind::Continue => {
                    let Some(target) = t.continue_to else {
                        match stmt.line {
                            Some(line) => bail!("`continue` outside of a loop at line {line}"),
                            None => bail!("`continue` outside of a loop"),
                        }
                    };
                    let id = self.alloc();
                    let mut node = FlowNode::new(id);
                    node.code.push("continue".to_owned());
                    if let Some(line) = stmt.line {
                        node.line_numbers.push(line);
                    }
                    node.successors.push(target);
                    nodes.insert(0, node);
                    end = id;
                }
                StmtKind::Return(value) => {
                    let id = self.alloc();
                    let mut node = FlowNode::new(id);
                    let uses = match value {
                        Some(expr) => {
                            let (vt, vu) = render_expr(expr);
                            node.code.push(format!("return {vt}"));
                            dedup(vu)
                        }
                        None => {
                            node.code.push("return".to_owned());
                            Vec::new()
                        }
                    };
                    node.uses = uses.clone();
                    if let Some(line) = stmt.line {
                        node.line_numbers.push(line);
                    }
                    node.successors.push(t.return_to);
                    du = DuPaths::from_node(id, &[], &uses).then(std::mem::take(&mut du));
                    nodes.insert(0, node);
                    end = id;
                }
                StmtKind::Decl(_)
                | StmtKind::Expr(_)
                | StmtKind::Empty
                | StmtKind::Opaque => {}
            }
        }
        self.flush_run(&mut pending, &mut nodes, &mut du, &mut end);

        if nodes.is_empty() {
            let id = self.alloc();
            let mut placeholder = FlowNode::new(id);
            placeholder.successors.push(end);
            nodes.push(placeholder);
            end = id;
        }
        Ok((nodes, end, du))
    }

    /// Merges a run of consecutive plain statements into one block node.
    ///
    /// `pending` holds the run in reverse source order; the node reads
    /// top-to-bottom and its definition-use events come from the run's
    /// accumulated define and use sets.
    fn flush_run(
        &mut self,
        pending: &mut Vec<&Stmt>,
        nodes: &mut Vec<FlowNode>,
        du: &mut DuPaths,
        end: &mut usize,
    ) {
        if pending.is_empty() {
            return;
        }
        let id = self.alloc();
        let mut node = FlowNode::new(id);
        let mut defines = Vec::new();
        let mut uses = Vec::new();
        for stmt in pending.drain(..).rev() {
            let (text, d, u) = match &stmt.kind {
                StmtKind::Decl(decl) => render_decl(decl),
                StmtKind::Expr(expr) => render_stmt_expr(expr),
                _ => (String::new(), Vec::new(), Vec::new()),
            };
            node.code.push(text);
            // Only the first line of a merged run is a split anchor.
            if node.line_numbers.is_empty() {
                if let Some(line) = stmt.line {
                    node.line_numbers.push(line);
                }
            }
            defines.extend(d);
            uses.extend(u);
        }
        node.defines = dedup(defines);
        node.uses = dedup(uses);
        node.successors.push(*end);

        *du = DuPaths::from_node(id, &node.defines, &node.uses).then(std::mem::take(du));
        nodes.insert(0, node);
        *end = id;
    }
}

/// Removes duplicate names, keeping first occurrence order.
fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = FxHashSet::default();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

impl FlowGraph {
    /// Builds the graph of one lowered function, with line numbers
    /// propagated down to every construct header.
    pub fn from_function(func: &FunctionAst) -> Result<Self> {
        let mut graph = GraphBuilder::default().build_function(func)?;
        super::graph::propagate_lines(&mut graph.root);
        Ok(graph)
    }
}
