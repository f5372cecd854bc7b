//! C-family AST consumed by the graph engine.
//!
//! The engine never touches tree-sitter nodes directly: [`adapter`] lowers a
//! parse tree into the closed variant types of [`types`], mapping anything
//! outside the supported construct set to an explicit opaque variant. That
//! keeps construct dispatch exhaustive at compile time instead of relying on
//! string-tag comparison with silent fallthrough.

mod adapter;
mod types;

pub use adapter::{function_nodes, lower_function, parse_functions, parse_tree};
pub(crate) use adapter::function_name;
pub use types::{
    CaseLabel, Expr, ForInit, FunctionAst, Stmt, StmtKind, SwitchClause, VarDecl,
};
