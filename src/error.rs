//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! Every subsystem (scanner, parser, resolver, runtime, CLI) converts its
//! failure modes into one of the variants defined here.  Runtime failures have
//! their own [`RuntimeError`] taxonomy because they travel through the
//! evaluator on every `?`, while static diagnostics are collected in bulk.
//!
//! The module **does not** decide how diagnostics are displayed; it only hands
//! them to an [`ErrorSink`].

use std::io;
use thiserror::Error;

use log::{debug, info};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static scope violation found by the resolver.
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    Resolve {
        message: String,
        line: usize,

        /// The offending name or keyword.
        lexeme: String,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<L: Into<String>, S: Into<String>>(line: usize, lexeme: L, msg: S) -> Self {
        let message: String = msg.into();
        let lexeme: String = lexeme.into();

        info!(
            "Creating Resolve error: line={}, lexeme={}, msg={}",
            line, lexeme, message
        );

        LoxError::Resolve {
            message,
            line,
            lexeme,
        }
    }

    /// Source line the error points at, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => Some(*line),
            LoxError::Runtime(e) => Some(e.line()),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }

    /// `true` for diagnostics produced before execution starts.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Failures raised while evaluating a program.  Each one aborts the current
/// `interpret` call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'.\n[line {line}]")]
    UndefinedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'.\n[line {line}]")]
    UndefinedProperty { name: String, line: usize },

    /// Operand or receiver of the wrong kind.
    #[error("{message}\n[line {line}]")]
    TypeError { message: String, line: usize },

    #[error("Can only call functions and classes.\n[line {line}]")]
    NotCallable { line: usize },

    #[error("Expected {expected} arguments but got {got}.\n[line {line}]")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    /// Raised when a call would exceed the interpreter's recursion ceiling.
    #[error("Stack overflow: more than {limit} nested calls.\n[line {line}]")]
    StackOverflow { limit: usize, line: usize },

    /// Failure reported by a native function.
    #[error("{message}\n[line {line}]")]
    Native { message: String, line: usize },
}

impl RuntimeError {
    pub fn type_error<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating TypeError: line={}, msg={}", line, message);

        RuntimeError::TypeError { message, line }
    }

    pub fn line(&self) -> usize {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::TypeError { line, .. }
            | RuntimeError::NotCallable { line }
            | RuntimeError::ArityMismatch { line, .. }
            | RuntimeError::StackOverflow { line, .. }
            | RuntimeError::Native { line, .. } => *line,
        }
    }
}

/// Destination for diagnostics.  The interpreter reports, the host decides
/// how (or whether) to show them.
pub trait ErrorSink {
    fn report(&mut self, error: LoxError);
}

/// Writes every diagnostic to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl ErrorSink for StderrSink {
    fn report(&mut self, error: LoxError) {
        debug!("Reporting: {}", error);

        eprintln!("{}", error);
    }
}

/// Collects diagnostics in memory.
impl ErrorSink for Vec<LoxError> {
    fn report(&mut self, error: LoxError) {
        self.push(error);
    }
}

/// How a complete run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,

    /// Lexing, parsing or resolution failed; nothing was executed.
    CompileError,

    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

impl Status {
    /// Conventional `sysexits`-style process exit code.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::CompileError => 65,
            Status::RuntimeError => 70,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
