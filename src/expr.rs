use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::stmt::FunctionDecl;

/// A name as it appeared in the source, detached from the token buffer so
/// the AST can outlive the scanner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ident {
    pub name: String,

    /// 1‑based source line.
    pub line: usize,
}

impl Ident {
    pub fn new<S: Into<String>>(name: S, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Number of enclosing scopes between a reference and its declaration.
///
/// Written once by the resolver, read by the interpreter.  `None` means the
/// name was not found in any lexical scope and lives in the global frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Depth(Cell<Option<usize>>);

impl Depth {
    #[inline]
    pub fn get(&self) -> Option<usize> {
        self.0.get()
    }

    #[inline]
    pub fn set(&self, depth: usize) {
        self.0.set(Some(depth));
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(Rc<str>),

    True,

    False,

    Nil,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// Arithmetic, comparison and equality operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Short‑circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        })
    }
}

/// **Abstract‑Syntax‑Tree node** for every kind of *expression*.
///
/// `Variable`, `Assign` and `This` carry a [`Depth`] slot filled in by the
/// resolver; nothing else in the tree changes after parsing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Literal {
        value: LiteralValue,
        line: usize,
    },

    /// *Example:* `!isReady` or `-42`
    Unary {
        operator: UnaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        line: usize,
    },

    /// `and` / `or`
    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
        line: usize,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        line: usize,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Variable {
        name: Ident,
        depth: Depth,
    },

    Assign {
        name: Ident,
        value: Box<Expr>,
        depth: Depth,
    },

    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,

        /// Line of the closing `)`, used for error locations.
        line: usize,
    },

    /// object.property
    Get { object: Box<Expr>, name: Ident },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Ident,
        value: Box<Expr>,
    },

    This { keyword: Ident, depth: Depth },

    /// Anonymous function: `fun (a, b) { ... }`
    Lambda(Rc<FunctionDecl>),
}

impl Expr {
    /// Line used when reporting errors about this expression.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Logical { line, .. }
            | Expr::Ternary { line, .. }
            | Expr::Call { line, .. } => *line,

            Expr::Grouping(expr) => expr.line(),

            Expr::Variable { name, .. }
            | Expr::Assign { name, .. }
            | Expr::Get { name, .. }
            | Expr::Set { name, .. } => name.line,

            Expr::This { keyword, .. } => keyword.line,

            Expr::Lambda(decl) => decl.line,
        }
    }

    pub fn variable(name: Ident) -> Self {
        Expr::Variable {
            name,
            depth: Depth::default(),
        }
    }
}
