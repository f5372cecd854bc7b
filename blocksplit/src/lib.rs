//! `blocksplit` — control-flow-graph driven block boundary extraction for
//! C-family sources.
//!
//! For every function body the engine builds an explicit control-flow graph
//! (one node per basic block or control-construct header, successor edges by
//! node id) together with a definition-use index per variable, then derives
//! the set of source lines that start a semantically meaningful block. Those
//! `split_lines` are the contract consumed by a downstream block-masking
//! pipeline; the masking itself is not part of this crate.
//!
//! # Pipeline
//!
//! 1. [`ast`] lowers a tree-sitter C parse tree into a closed statement /
//!    expression AST with an explicit opaque variant for unsupported
//!    constructs.
//! 2. [`cfg`] builds the graph and DU index, propagates line numbers and
//!    extracts the split-line set.
//! 3. [`analyzer`] orchestrates whole files and directories, wiring the
//!    simplified [`splitter`] in as a degraded fallback when the full build
//!    fails.
//!
//! # Design principles
//!
//! - **One graph per function**: never cross function boundaries.
//! - **Lexical def/use only**: variables are tracked by identifier name; no
//!   alias or type analysis.
//! - **Degrade, don't die**: unknown constructs become opaque statements that
//!   keep the graph connected without data-flow information.

pub mod analyzer;
pub mod ast;
pub mod cfg;
pub mod config;
pub mod output;
pub mod splitter;
