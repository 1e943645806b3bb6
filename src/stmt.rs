use std::rc::Rc;

use serde::Serialize;

use crate::expr::{Expr, Ident};

/// Shared shape of named functions, methods and lambdas.
///
/// Held behind an `Rc` so every closure created from it can keep the
/// declaration alive without cloning the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    /// `None` for lambdas.
    pub name: Option<Ident>,

    /// Parameter names (arity ≤ 255).
    pub params: Vec<Ident>,

    pub body: Vec<Stmt>,

    /// Line of the `fun` keyword or method name.
    pub line: usize,
}

impl FunctionDecl {
    pub fn name(&self) -> &str {
        self.name.as_ref().map_or("<lambda>", |ident| ident.name.as_str())
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDecl {
    pub name: Ident,

    /// Always an `Expr::Variable` when present.
    pub superclass: Option<Expr>,

    /// Instance methods; `this` is bound on access.
    pub methods: Vec<Rc<FunctionDecl>>,

    /// Methods declared with a leading `class`, called on the class itself.
    pub class_methods: Vec<Rc<FunctionDecl>>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence of
/// these nodes returned by [`crate::parser::Parser::parse`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// `"var" IDENT ("=" initializer)? ";"`
    Var {
        name: Ident,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// Also the target of `for` desugaring.
    While { condition: Expr, body: Box<Stmt> },

    Function(Rc<FunctionDecl>),

    Class(ClassDecl),

    Return {
        /// The `return` keyword (for error locations).
        keyword: Ident,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },
}
