//! Static resolver pass for the **Rox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String, bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `return` or `this`).  Errors are collected and the walk carries on, so a
//!    program's scope errors are all reported at once.
//! 3. Store, in each `Variable`/`Assign`/`This` node, how many scopes lie
//!    between the reference and its declaration.  Names not found in any scope
//!    are left unresolved and looked up in the global frame at runtime.
//!
//! Every function and lambda opens **two** scopes (parameters, then body) and
//! every class opens one scope holding `this`, mirroring the frames the
//! interpreter creates, so the recorded depths match the runtime chain.

use std::collections::HashMap;

use log::{debug, info};

use crate::callable::{INITIALIZER, THIS};
use crate::error::LoxError;
use crate::expr::{Depth, Expr, Ident};
use crate::stmt::{ClassDecl, FunctionDecl, Stmt};

/// What kind of function body are we in?  Used to validate `return` and `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Lambda,
    Method,
    Initializer,

    /// Class‑level method; has no `this`.
    Unbound,
}

/// Are we inside a class body?
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Resolver context: scope stack, enclosing function and class kinds, and the
/// diagnostics collected so far.  Independent of any interpreter.
#[derive(Debug)]
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements and return every diagnostic found.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Vec<LoxError> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        debug_assert!(self.scopes.is_empty(), "unbalanced scope stack");

        std::mem::take(&mut self.errors)
    }

    /// Resolve a lone expression (no enclosing scopes, so every name is global).
    pub fn resolve_expression(&mut self, expr: &Expr) -> Vec<LoxError> {
        self.resolve_expr(expr);
        std::mem::take(&mut self.errors)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Class(decl) => self.resolve_class(decl),

            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // Defined before the body so the function can call itself.
                if let Some(name) = &decl.name {
                    self.declare(name);
                    self.define(name);
                }
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(
                            keyword,
                            "Can't return a value from an initializer; 'init' always returns the new instance.",
                        );
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(&mut self, decl: &ClassDecl) {
        let enclosing_class: ClassType = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(&decl.name);
        self.define(&decl.name);

        if let Some(superclass) = &decl.superclass {
            if let Expr::Variable { name, .. } = superclass {
                if name.name == decl.name.name {
                    self.error(name, "A class can't inherit from itself.");
                }
            }

            self.resolve_expr(superclass);
        }

        // `this` lives just outside each method's parameter scope.
        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(THIS.to_string(), true);
        }

        for method in &decl.methods {
            let kind: FunctionType = if method.name() == INITIALIZER {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        for method in &decl.class_methods {
            self.resolve_function(method, FunctionType::Unbound);
        }

        self.end_scope();

        debug!(
            "Resolved class '{}' with {} method(s)",
            decl.name.name,
            decl.methods.len() + decl.class_methods.len()
        );

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { name, depth } => {
                let in_own_initializer: bool = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.name) == Some(&false));

                if in_own_initializer {
                    self.error(name, "Can't read local variable in its own initializer.");
                }

                self.resolve_local(name, depth);
            }

            Expr::Assign { name, value, depth } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(name, depth);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            // Property names are looked up on the instance at runtime.
            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { keyword, depth } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                } else if self.current_function == FunctionType::Unbound {
                    self.error(keyword, "Can't use 'this' in an unbound method.");
                } else {
                    self.resolve_local(keyword, depth);
                }
            }

            Expr::Lambda(decl) => self.resolve_function(decl, FunctionType::Lambda),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// One scope for the parameters, a second one for the body block.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }

        self.begin_scope();
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Ident) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.name) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(name.name.clone(), false);
    }

    fn define(&mut self, name: &Ident) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.name.clone(), true);
        }
    }

    fn error(&mut self, at: &Ident, message: &str) {
        self.errors
            .push(LoxError::resolve(at.line, at.name.as_str(), message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d` (number of scopes to
    /// cross outward from the innermost), or leave it global.
    fn resolve_local(&mut self, name: &Ident, depth: &Depth) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.name) {
                debug!("Resolved '{}' at depth {}", name.name, distance);
                depth.set(distance);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.name);
    }
}
