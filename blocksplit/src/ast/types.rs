/// One parsed function: signature metadata plus the lowered body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionAst {
    /// Function name as written in the source.
    pub name: String,
    /// Rendered signature, e.g. `int main(int argc, char **argv)`.
    pub signature: String,
    /// Formal parameters; each contributes a define at the entry node.
    pub params: Vec<VarDecl>,
    /// Statements of the function body, in source order.
    pub body: Vec<Stmt>,
    /// 1-indexed line of the function definition.
    pub line: Option<usize>,
}

/// A statement with its optional source coordinate.
///
/// A missing line is tolerated everywhere: the node simply never becomes a
/// split anchor of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// The statement variant.
    pub kind: StmtKind,
    /// 1-indexed source line the statement starts on.
    pub line: Option<usize>,
}

/// Closed set of statement constructs the structured builder dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// A single variable declaration (multi-declarator declarations are
    /// split into one `Decl` per declarator during lowering).
    Decl(VarDecl),
    /// An expression used as a statement (assignment, call, bare expression).
    Expr(Expr),
    /// A lone `;`.
    Empty,
    /// `if (cond) ... else ...`; a branch is `None` when absent or empty.
    If {
        /// Condition expression.
        cond: Expr,
        /// Then-branch statements.
        then_branch: Option<Vec<Stmt>>,
        /// Else-branch statements (an `else if` chain nests here).
        else_branch: Option<Vec<Stmt>>,
    },
    /// `while (cond) body`.
    While {
        /// Loop condition.
        cond: Expr,
        /// Loop body statements, `None` when empty.
        body: Option<Vec<Stmt>>,
    },
    /// `do body while (cond);`.
    DoWhile {
        /// Loop condition, evaluated after each iteration.
        cond: Expr,
        /// Loop body statements, `None` when empty.
        body: Option<Vec<Stmt>>,
        /// Line of the trailing `while (...)`, anchored in addition to the
        /// `do` line.
        cond_line: Option<usize>,
    },
    /// `for (init; cond; step) body`.
    For {
        /// Loop initializer clause.
        init: ForInit,
        /// Optional loop condition.
        cond: Option<Expr>,
        /// Optional per-iteration update expression.
        step: Option<Expr>,
        /// Loop body statements, `None` when empty.
        body: Option<Vec<Stmt>>,
    },
    /// `switch (cond) { case ... }`.
    Switch {
        /// Scrutinee expression.
        cond: Expr,
        /// Case and default clauses in source order.
        clauses: Vec<SwitchClause>,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `return;` or `return expr;`.
    Return(Option<Expr>),
    /// Anything unsupported (`goto`, labels, nested bare blocks, inline
    /// assembly, parse errors). Rendered as empty text with no defines or
    /// uses, preserving graph connectivity without data-flow information.
    Opaque,
}

/// The initializer clause of a `for` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    /// `for (int i = 0, j = n; ...)`.
    Decls(Vec<VarDecl>),
    /// `for (i = 0; ...)` or any other expression initializer.
    Expr(Expr),
    /// `for (; ...)`.
    None,
}

/// One `case`/`default` clause of a `switch`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchClause {
    /// The clause label.
    pub label: CaseLabel,
    /// Statements of the clause body, in source order.
    pub body: Vec<Stmt>,
    /// 1-indexed line of the label.
    pub line: Option<usize>,
}

/// Label of a switch clause.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseLabel {
    /// `case expr:`.
    Case(Expr),
    /// `default:`.
    Default,
}

/// A single declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    /// Storage classes and qualifiers in source order (`static`, `const`...).
    pub storage: Vec<String>,
    /// Type text as written (`int`, `struct point`, `unsigned long`).
    pub ty: String,
    /// Declared identifier; `None` for abstract declarators.
    pub name: Option<String>,
    /// Declarator text without the initializer (`x`, `*buf`, `arr[10]`).
    pub declarator: String,
    /// Optional initializer expression.
    pub init: Option<Expr>,
}

/// Closed set of expression constructs the renderer dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An identifier reference; the one construct that produces a use.
    Ident(String),
    /// A literal (number, string, character, `true`, `NULL`...).
    Constant(String),
    /// Prefix or postfix unary operation (`-x`, `!x`, `*p`, `&x`, `i++`).
    Unary {
        /// Operator text.
        op: String,
        /// Operand expression.
        operand: Box<Expr>,
        /// True for postfix forms (`i++`, `i--`).
        postfix: bool,
    },
    /// Binary operation.
    Binary {
        /// Operator text.
        op: String,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `cond ? a : b`.
    Ternary {
        /// Condition.
        cond: Box<Expr>,
        /// Value when the condition holds.
        then_expr: Box<Expr>,
        /// Value otherwise.
        else_expr: Box<Expr>,
    },
    /// Assignment, possibly compound (`=`, `+=`, `<<=`, ...).
    Assign {
        /// Operator text.
        op: String,
        /// Assignment target.
        target: Box<Expr>,
        /// Assigned value.
        value: Box<Expr>,
    },
    /// `base[index]`.
    Index {
        /// Indexed expression.
        base: Box<Expr>,
        /// Subscript expression.
        index: Box<Expr>,
    },
    /// Function call; the callee name is not counted as a use.
    Call {
        /// Called expression.
        callee: Box<Expr>,
        /// Argument expressions.
        args: Vec<Expr>,
    },
    /// `(type)expr`.
    Cast {
        /// Target type text.
        ty: String,
        /// Cast operand.
        operand: Box<Expr>,
    },
    /// `{a, b, c}`.
    InitList(Vec<Expr>),
    /// Comma expression, flattened (`a, b, c`).
    Comma(Vec<Expr>),
    /// An absent operand slot; renders to empty text with no uses.
    Missing,
    /// An unrecognized expression kind; renders to empty text with no uses
    /// (deliberate silent degrade).
    Opaque,
}
