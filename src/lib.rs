pub mod ast_printer;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use log::{debug, info};

use error::{ErrorSink, Status};
use interpreter::Interpreter;
use parser::Parser;
use scanner::Scanner;
use stmt::Stmt;
use token::Token;

/// Scans `source`, reporting every lexical error.  `None` if there were any.
pub fn scan<'a>(source: &'a str, sink: &mut dyn ErrorSink) -> Option<Vec<Token<'a>>> {
    let mut tokens: Vec<Token<'a>> = Vec::new();
    let mut ok: bool = true;

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => {
                ok = false;
                sink.report(e);
            }
        }
    }

    ok.then_some(tokens)
}

/// Scans and parses `source`.  Every lexical and syntax error is reported;
/// `None` if there were any.
pub fn parse_source(source: &str, sink: &mut dyn ErrorSink) -> Option<Vec<Stmt>> {
    let tokens: Vec<Token<'_>> = scan(source, sink)?;

    match Parser::new(&tokens).parse() {
        Ok(statements) => {
            info!("Parsed {} statements", statements.len());
            Some(statements)
        }
        Err(errors) => {
            debug!("Parse failed with {} error(s)", errors.len());
            for error in errors {
                sink.report(error);
            }
            None
        }
    }
}

/// Runs a whole program through `interpreter`: scan, parse, resolve, execute.
pub fn run_source(interpreter: &mut Interpreter, source: &str, sink: &mut dyn ErrorSink) -> Status {
    match parse_source(source, sink) {
        Some(statements) => interpreter.interpret(&statements, sink),
        None => Status::CompileError,
    }
}
