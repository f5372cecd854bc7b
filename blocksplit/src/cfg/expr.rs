//! Rendering of expressions and declarations into code fragments plus the
//! variable names they read and write.
//!
//! Rendering is lexical: an identifier is a use wherever it appears, except
//! the callee position of a call and the head of an assignment target.
//! Assignment targets still contribute their *inner* identifiers as uses
//! (`a[i] = x` reads `i`, writes `a`).

use crate::ast::{Expr, VarDecl};

/// Renders an expression to `(text, uses)`.
pub(crate) fn render_expr(expr: &Expr) -> (String, Vec<String>) {
    match expr {
        Expr::Ident(name) => (name.clone(), vec![name.clone()]),
        Expr::Constant(text) => (text.clone(), Vec::new()),
        Expr::Unary {
            op,
            operand,
            postfix,
        } => {
            let (inner, uses) = render_expr(operand);
            let text = if *postfix {
                format!("{inner} {op}")
            } else {
                format!("{op} {inner}")
            };
            (text, uses)
        }
        Expr::Binary { op, left, right } => {
            let (lt, mut uses) = render_expr(left);
            let (rt, ru) = render_expr(right);
            uses.extend(ru);
            (format!("{lt} {op} {rt}"), uses)
        }
        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            let (ct, mut uses) = render_expr(cond);
            let (tt, tu) = render_expr(then_expr);
            let (et, eu) = render_expr(else_expr);
            uses.extend(tu);
            uses.extend(eu);
            (format!("{ct} ? {tt} : {et}"), uses)
        }
        Expr::Assign { op, target, value } => {
            let (lt, lu) = render_expr(target);
            let (rt, mut uses) = render_expr(value);
            // The head identifier of the target is the write; any further
            // identifiers inside it (subscripts, pointer arithmetic) are
            // reads.
            let mut all = lu.into_iter().skip(1).collect::<Vec<_>>();
            all.append(&mut uses);
            (format!("{lt} {op} {rt}"), all)
        }
        Expr::Index { base, index } => {
            let (bt, mut uses) = render_expr(base);
            let (it, iu) = render_expr(index);
            uses.extend(iu);
            (format!("{bt}[{it}]"), uses)
        }
        Expr::Call { callee, args } => {
            let (ct, _) = render_expr(callee);
            let mut uses = Vec::new();
            let mut parts = Vec::with_capacity(args.len());
            for arg in args {
                let (at, au) = render_expr(arg);
                parts.push(at);
                uses.extend(au);
            }
            (format!("{ct}({})", parts.join(", ")), uses)
        }
        Expr::Cast { ty, operand } => {
            let (inner, uses) = render_expr(operand);
            (format!("({ty}){inner}"), uses)
        }
        Expr::InitList(items) => {
            let mut uses = Vec::new();
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let (it, iu) = render_expr(item);
                parts.push(it);
                uses.extend(iu);
            }
            (format!("{{{}}}", parts.join(", ")), uses)
        }
        Expr::Comma(items) => {
            let mut uses = Vec::new();
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let (it, iu) = render_expr(item);
                parts.push(it);
                uses.extend(iu);
            }
            (parts.join(", "), uses)
        }
        Expr::Missing | Expr::Opaque => (String::new(), Vec::new()),
    }
}

/// Renders an expression used in statement position to
/// `(text, defines, uses)`.
///
/// Only an assignment produces a define; every other expression statement
/// reads without writing.
pub(crate) fn render_stmt_expr(expr: &Expr) -> (String, Vec<String>, Vec<String>) {
    if let Expr::Assign { op, target, value } = expr {
        let (lt, lu) = render_expr(target);
        let (rt, ru) = render_expr(value);
        let mut defines = Vec::new();
        let mut uses = Vec::new();
        let mut lu = lu.into_iter();
        if let Some(head) = lu.next() {
            defines.push(head);
        }
        uses.extend(lu);
        uses.extend(ru);
        return (format!("{lt} {op} {rt}"), defines, uses);
    }
    let (text, uses) = render_expr(expr);
    (text, Vec::new(), uses)
}

/// Renders a declaration to `(text, defines, uses)`.
pub(crate) fn render_decl(decl: &VarDecl) -> (String, Vec<String>, Vec<String>) {
    let mut text = String::new();
    for spec in &decl.storage {
        text.push_str(spec);
        text.push(' ');
    }
    if !decl.ty.is_empty() {
        text.push_str(&decl.ty);
        text.push(' ');
    }
    text.push_str(&decl.declarator);
    let defines = decl.name.iter().cloned().collect();
    let uses = match &decl.init {
        Some(init) => {
            let (it, iu) = render_expr(init);
            text.push_str(" = ");
            text.push_str(&it);
            iu
        }
        None => Vec::new(),
    };
    (text, defines, uses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_owned()))
    }

    #[test]
    fn call_drops_callee_use() {
        let expr = Expr::Call {
            callee: ident("printf"),
            args: vec![Expr::Ident("x".to_owned()), Expr::Ident("y".to_owned())],
        };
        let (text, uses) = render_expr(&expr);
        assert_eq!(text, "printf(x, y)");
        assert_eq!(uses, vec!["x", "y"]);
    }

    #[test]
    fn assignment_target_head_is_define_not_use() {
        let expr = Expr::Assign {
            op: "=".to_owned(),
            target: Box::new(Expr::Index {
                base: ident("a"),
                index: ident("i"),
            }),
            value: ident("x"),
        };
        let (text, defines, uses) = render_stmt_expr(&expr);
        assert_eq!(text, "a[i] = x");
        assert_eq!(defines, vec!["a"]);
        assert_eq!(uses, vec!["i", "x"]);
    }

    #[test]
    fn compound_assignment_reads_nested_target_idents() {
        let expr = Expr::Assign {
            op: "+=".to_owned(),
            target: ident("sum"),
            value: ident("i"),
        };
        let (text, uses) = render_expr(&expr);
        assert_eq!(text, "sum += i");
        // In value position the whole target tail plus the RHS counts.
        assert_eq!(uses, vec!["i"]);
    }

    #[test]
    fn postfix_update_renders_after_operand() {
        let expr = Expr::Unary {
            op: "++".to_owned(),
            operand: ident("i"),
            postfix: true,
        };
        let (text, uses) = render_expr(&expr);
        assert_eq!(text, "i ++");
        assert_eq!(uses, vec!["i"]);
    }

    #[test]
    fn decl_with_init_defines_name_and_uses_init() {
        let decl = VarDecl {
            storage: vec!["const".to_owned()],
            ty: "int".to_owned(),
            name: Some("y".to_owned()),
            declarator: "y".to_owned(),
            init: Some(Expr::Binary {
                op: "+".to_owned(),
                left: ident("a"),
                right: ident("b"),
            }),
        };
        let (text, defines, uses) = render_decl(&decl);
        assert_eq!(text, "const int y = a + b");
        assert_eq!(defines, vec!["y"]);
        assert_eq!(uses, vec!["a", "b"]);
    }

    #[test]
    fn opaque_renders_empty() {
        assert_eq!(render_expr(&Expr::Opaque), (String::new(), Vec::new()));
    }
}
