use crate::lexer::Token;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLit(i64),
    BoolLit(bool),
    StringLit(String),
    /// An identifier (e.g. `foo`).
    Identifier(String),
    /// An array literal (e.g. `[1, 2, 3]`).
    ArrayLit(Vec<Expr>),
    /// A hash literal (e.g. `{"one": 1}`). Pairs are kept in source order;
    /// lowering decides the evaluation order.
    HashLit(Vec<(Expr, Expr)>),
    /// A function call (e.g. `foo(1, bar, baz())`). The callee is an
    /// arbitrary expression, so `fn(x) { x }(1)` is a valid call.
    FnCall {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// A binary expression (e.g. `1+1`).
    Binary {
        lhs: Box<Expr>,
        op: Token,
        rhs: Box<Expr>,
    },
    Unary {
        op: Token,
        arg: Box<Expr>,
    },
    /// An index expression (e.g. `arr[0]`).
    Index {
        lhs: Box<Expr>,
        index: Box<Expr>,
    },
    /// `if` is an expression; a missing or skipped branch evaluates to null.
    If {
        cond: Box<Expr>,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    /// An anonymous function literal (e.g. `fn(x, y) { x + y }`).
    FunctionLit {
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    LetDeclaration {
        ident: String,
        initializer: Expr,
    },
    ReturnStmt(Expr),
    ExprStmt(Expr),
    Error,
}

fn join(items: &[impl fmt::Display]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The canonical form wraps every binary, unary and index expression in
/// parentheses, which makes operator precedence visible in tests.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLit(val) => write!(f, "{}", val),
            Expr::BoolLit(val) => write!(f, "{}", val),
            Expr::StringLit(val) => write!(f, "{}", val),
            Expr::Identifier(ident) => write!(f, "{}", ident),
            Expr::ArrayLit(elements) => write!(f, "[{}]", join(elements)),
            Expr::HashLit(pairs) => {
                let pairs = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{}}}", pairs)
            }
            Expr::FnCall { callee, args } => write!(f, "{}({})", callee, join(args)),
            Expr::Binary { lhs, op, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::Unary { op, arg } => write!(f, "({}{})", op, arg),
            Expr::Index { lhs, index } => write!(f, "({}[{}])", lhs, index),
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                write!(f, "if {} {{ {} }}", cond, join(then_branch))?;
                if let Some(else_branch) = else_branch {
                    write!(f, " else {{ {} }}", join(else_branch))?;
                }
                Ok(())
            }
            Expr::FunctionLit { params, body } => {
                write!(f, "fn({}) {{ {} }}", params.join(", "), join(body))
            }
            Expr::Error => write!(f, "<error>"),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::LetDeclaration { ident, initializer } => {
                write!(f, "let {} = {};", ident, initializer)
            }
            Stmt::ReturnStmt(expr) => write!(f, "return {};", expr),
            Stmt::ExprStmt(expr) => write!(f, "{}", expr),
            Stmt::Error => write!(f, "<error>"),
        }
    }
}
