//! Anything that can appear on the left of `(...)`.
//!
//! The interpreter checks arity and the recursion ceiling before calling
//! [`Callable::call`], so implementations can assume they receive exactly
//! `arity()` arguments.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::class::Instance;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Completion, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// Name bound to the receiver inside methods.
pub const THIS: &str = "this";

/// Name of the constructor method.
pub const INITIALIZER: &str = "init";

pub trait Callable: fmt::Debug + fmt::Display {
    fn arity(&self) -> usize;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError>;
}

/// A user‑defined function, method or lambda paired with the environment it
/// was defined in.
#[derive(Clone)]
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl Function {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Function {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        self.declaration.name()
    }

    /// A copy of this method whose closure is a fresh frame binding `this`
    /// to `instance`.  The frame is a child of the method's own closure, so
    /// it sits exactly where the resolver placed the class's `this` scope.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let mut frame: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        frame.define(THIS, Value::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: frame.shared(),
            is_initializer: self.is_initializer,
        }
    }

    /// The instance bound by [`bind`](Self::bind), for initializers.
    fn bound_this(&self, line: usize) -> Result<Value, RuntimeError> {
        Environment::get_at(&self.closure, 0, THIS, line)
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.arity()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling user-defined function '{}'", self.name());

        // Parameters live in their own frame, parented by the closure (never
        // by the caller); the body block gets a second frame below it.
        let mut parameters: Environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            parameters.define(&param.name, argument);
        }

        let completion: Completion =
            interpreter.execute_block(&self.declaration.body, parameters.shared())?;

        if self.is_initializer {
            return self.bound_this(line);
        }

        match completion {
            Completion::Return(value) => {
                debug!("Function '{}' returned: {}", self.name(), value);
                Ok(value)
            }
            Completion::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.declaration.name {
            Some(name) => write!(f, "<fn {}>", name),
            None => write!(f, "<lambda>"),
        }
    }
}

/// Closures can reach themselves through their environment, so only the
/// name is shown.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

/// Signature of a host function.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// A function implemented in Rust and exposed in the global frame.
#[derive(Debug, Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(&arguments).map_err(|message| RuntimeError::Native { message, line })
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
