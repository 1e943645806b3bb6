#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::{LoxError, Status};
use rox::interpreter::Interpreter;

/// In‑memory `print` target that stays readable after the interpreter
/// has taken ownership of its writer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Run {
    pub output: String,
    pub errors: Vec<LoxError>,
    pub status: Status,
}

impl Run {
    /// Printed lines, without the trailing newline.
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}

/// A fresh interpreter with its output captured.
pub fn interpreter() -> (Interpreter, SharedBuffer) {
    let buffer: SharedBuffer = SharedBuffer::default();
    let interpreter: Interpreter = Interpreter::with_output(Box::new(buffer.clone()));

    (interpreter, buffer)
}

/// Runs `source` as a whole program on a fresh interpreter.
pub fn run(source: &str) -> Run {
    let (mut interpreter, buffer) = interpreter();
    run_with(&mut interpreter, &buffer, source)
}

/// Runs `source` on an existing interpreter, returning everything printed
/// so far.
pub fn run_with(interpreter: &mut Interpreter, buffer: &SharedBuffer, source: &str) -> Run {
    let mut errors: Vec<LoxError> = Vec::new();
    let status: Status = rox::run_source(interpreter, source, &mut errors);

    Run {
        output: buffer.contents(),
        errors,
        status,
    }
}

/// Scans and parses `source`, panicking on any syntax error.
pub fn parse(source: &str) -> Vec<rox::stmt::Stmt> {
    let mut errors: Vec<LoxError> = Vec::new();

    match rox::parse_source(source, &mut errors) {
        Some(statements) => statements,
        None => panic!("unexpected syntax errors: {:?}", errors),
    }
}
