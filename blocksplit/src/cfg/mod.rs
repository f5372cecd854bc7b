//! Control-flow graph construction and split-line extraction.
//!
//! The builder walks a lowered function body back to front, so every
//! statement knows the node id of what executes after it before its own node
//! is allocated. Each control construct wires its successor edges the same
//! way: a header node for the condition, child containers for branch bodies,
//! and explicit fallthrough targets threaded through [`builder`].
//!
//! Alongside the graph, every node contributes definition/use events to a
//! per-variable sequence index ([`dupath`]): conditions come before their
//! branches, branches form alternatives, loop bodies form repetitions.

mod builder;
mod dupath;
mod expr;
mod graph;
mod types;

#[cfg(test)]
mod tests;

pub use builder::GraphBuilder;
pub use dupath::{DuKind, DuPaths, DuStep};
pub use types::{FlowGraph, FlowNode};
