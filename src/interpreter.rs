//! Tree‑walking evaluator.
//!
//! Variable references are looked up with the depth the resolver stored in
//! the AST: `Some(d)` walks exactly `d` frames up from the current one, `None`
//! reads the global frame.  `return` is modelled as [`Completion::Return`],
//! which statement execution hands back up through blocks until the function
//! call that owns them turns it into a value.  Runtime errors travel on the
//! `Err` side and abort the whole `interpret` call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::callable::{Callable, Function, NativeFunction, INITIALIZER};
use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{ErrorSink, LoxError, RuntimeError, Status};
use crate::expr::{BinaryOp, Depth, Expr, Ident, LiteralValue, LogicalOp, UnaryOp};
use crate::resolver::Resolver;
use crate::stmt::{ClassDecl, FunctionDecl, Stmt};
use crate::value::Value;

/// Maximum number of nested calls before `StackOverflow` is raised.
pub const MAX_CALL_DEPTH: usize = 1000;

/// Remaining native stack below which a call grows the stack.
const RED_ZONE: usize = 128 * 1024;

/// Size of each native stack extension.
const STACK_GROWTH: usize = 2 * 1024 * 1024;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal,

    /// A `return` is unwinding to the nearest call boundary.
    Return(Value),
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    output: Box<dyn Write>,

    /// Number of calls currently on the stack.
    call_depth: usize,

    /// Value of the most recent expression statement.
    last_value: Value,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an Interpreter whose `print` statements write to `output`, and
    /// defines native functions such as `clock`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: Rc<RefCell<Environment>> = Environment::new().shared();

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let millis: i64 = chrono::Utc::now().timestamp_millis();
                    Ok(Value::Number(millis as f64 / 1000.0))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            output,
            call_depth: 0,
            last_value: Value::Nil,
        }
    }

    pub fn globals(&self) -> &Rc<RefCell<Environment>> {
        &self.globals
    }

    pub fn last_value(&self) -> &Value {
        &self.last_value
    }

    /// Resolves, then runs a program.
    ///
    /// Nothing executes if resolution reports any error.  The first runtime
    /// error stops the remaining statements; global state from the statements
    /// that did run is kept.
    pub fn interpret(&mut self, statements: &[Stmt], sink: &mut dyn ErrorSink) -> Status {
        let errors: Vec<LoxError> = Resolver::new().resolve(statements);

        if !errors.is_empty() {
            info!("Resolution produced {} error(s); not executing", errors.len());

            for error in errors {
                sink.report(error);
            }

            return Status::CompileError;
        }

        match self.execute_all(statements) {
            Ok(()) => {
                info!("Interpretation completed successfully");
                Status::Ok
            }

            Err(e) => {
                debug!("Runtime error: {}", e);

                sink.report(LoxError::Runtime(e));

                Status::RuntimeError
            }
        }
    }

    /// Executes already resolved top‑level statements in order.
    pub fn execute_all(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        // `return` at top level is rejected by the resolver.
        let result: IResult<()> = statements
            .iter()
            .try_for_each(|stmt| self.execute(stmt).map(|_| ()));

        // Whatever was printed before a runtime error still reaches the output.
        if let Err(e) = self.output.flush() {
            debug!("Failed to flush output: {}", e);
        }

        result
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                self.last_value = self.evaluate(expr)?;
                Ok(Completion::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);

                writeln!(self.output, "{}", value).map_err(|e| RuntimeError::Native {
                    message: format!("Failed to write output: {}", e),
                    line: expr.line(),
                })?;

                Ok(Completion::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name, value);

                self.environment.borrow_mut().define(&name.name, value);
                Ok(Completion::Normal)
            }

            Stmt::Block(statements) => {
                let enclosing: Rc<RefCell<Environment>> = Rc::clone(&self.environment);
                self.execute_block(statements, enclosing)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Completion::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Completion::Return(value) = self.execute(body)? {
                        return Ok(Completion::Return(value));
                    }
                }

                Ok(Completion::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name());

                // The closure is the frame the name is defined in, so the
                // function can see itself.
                let function: Function =
                    Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(decl.name(), Value::Callable(Rc::new(function)));
                Ok(Completion::Normal)
            }

            Stmt::Class(decl) => {
                self.execute_class(decl)?;
                Ok(Completion::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                Ok(Completion::Return(value))
            }
        }
    }

    /// Runs `statements` in a new frame whose parent is `enclosing`.  The
    /// previous frame is restored however the block ends.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        enclosing: Rc<RefCell<Environment>>,
    ) -> IResult<Completion> {
        let frame: Rc<RefCell<Environment>> = Environment::with_enclosing(enclosing).shared();
        let previous: Rc<RefCell<Environment>> = std::mem::replace(&mut self.environment, frame);

        let result: IResult<Completion> = self.execute_statements(statements);

        self.environment = previous;
        result
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> IResult<Completion> {
        for stmt in statements {
            if let Completion::Return(value) = self.execute(stmt)? {
                return Ok(Completion::Return(value));
            }
        }

        Ok(Completion::Normal)
    }

    fn execute_class(&mut self, decl: &ClassDecl) -> IResult<()> {
        debug!("Defining class '{}'", decl.name);

        let superclass: Option<Rc<Class>> = match &decl.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(RuntimeError::type_error(
                        expr.line(),
                        format!("Superclass must be a class, got {}.", other.type_name()),
                    ));
                }
            },
            None => None,
        };

        let methods: HashMap<String, Function> = decl
            .methods
            .iter()
            .map(|method| {
                let is_initializer: bool = method.name() == INITIALIZER;
                let function: Function =
                    Function::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);
                (method.name().to_string(), function)
            })
            .collect();

        // Class methods are resolved inside the class's `this` scope; give
        // them an empty frame in that position.
        let static_frame: Rc<RefCell<Environment>> =
            Environment::with_enclosing(Rc::clone(&self.environment)).shared();

        let class_methods: HashMap<String, Function> = decl
            .class_methods
            .iter()
            .map(|method| {
                let function: Function =
                    Function::new(Rc::clone(method), Rc::clone(&static_frame), false);
                (method.name().to_string(), function)
            })
            .collect();

        let class: Class = Class::new(decl.name.name.clone(), superclass, methods, class_methods);

        self.environment
            .borrow_mut()
            .define(&decl.name.name, Value::Class(Rc::new(class)));

        info!("Class '{}' defined", decl.name);

        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(literal(value)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary {
                operator,
                right,
                line,
            } => {
                let right: Value = self.evaluate(right)?;
                unary(*operator, right, *line)
            }

            Expr::Binary {
                left,
                operator,
                right,
                line,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                binary(*operator, left, right, *line)
            }

            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = match operator {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { name, depth } => self.look_up(name, depth),

            Expr::This { keyword, depth } => self.look_up(keyword, depth),

            Expr::Assign { name, value, depth } => {
                let value: Value = self.evaluate(value)?;

                match depth.get() {
                    Some(d) => Environment::assign_at(
                        &self.environment,
                        d,
                        &name.name,
                        value.clone(),
                        name.line,
                    )?,
                    None => Environment::assign_global(
                        &self.globals,
                        &name.name,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                arguments,
                line,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let function: &dyn Callable = match &callee {
                    Value::Callable(function) => &**function,
                    Value::Class(class) => class,
                    _ => return Err(RuntimeError::NotCallable { line: *line }),
                };

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call(function, values, *line)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, &name.name, name.line),

                Value::Class(class) => match class.find_class_method(&name.name) {
                    Some(method) => Ok(Value::Callable(Rc::new(method.clone()))),
                    None => Err(RuntimeError::UndefinedProperty {
                        name: name.name.clone(),
                        line: name.line,
                    }),
                },

                other => Err(RuntimeError::type_error(
                    name.line,
                    format!("Only instances have properties, got {}.", other.type_name()),
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::type_error(name.line, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(&name.name, value.clone());

                Ok(value)
            }

            Expr::Lambda(decl) => Ok(self.closure(decl)),
        }
    }

    /// Invokes `callee` after checking arity and the recursion ceiling.  The
    /// depth counter is released on every exit path.
    pub fn call(
        &mut self,
        callee: &dyn Callable,
        arguments: Vec<Value>,
        line: usize,
    ) -> IResult<Value> {
        if arguments.len() != callee.arity() {
            return Err(RuntimeError::ArityMismatch {
                expected: callee.arity(),
                got: arguments.len(),
                line,
            });
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            debug!("Refusing call to {} at depth {}", callee, self.call_depth);

            return Err(RuntimeError::StackOverflow {
                limit: MAX_CALL_DEPTH,
                line,
            });
        }

        self.call_depth += 1;
        let result: IResult<Value> =
            stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || callee.call(self, arguments, line));
        self.call_depth -= 1;

        result
    }

    fn look_up(&self, name: &Ident, depth: &Depth) -> IResult<Value> {
        match depth.get() {
            Some(d) => Environment::get_at(&self.environment, d, &name.name, name.line),
            None => Environment::get_global(&self.globals, &name.name, name.line),
        }
    }

    fn closure(&self, decl: &Rc<FunctionDecl>) -> Value {
        let function: Function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
        Value::Callable(Rc::new(function))
    }

    /// Current nesting of calls; zero between top‑level statements.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }
}

fn literal(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(Rc::clone(s)),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn unary(operator: UnaryOp, right: Value, line: usize) -> IResult<Value> {
    match operator {
        UnaryOp::Negate => match right {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(RuntimeError::type_error(
                line,
                format!("Operand must be a number, got {}.", other.type_name()),
            )),
        },
        UnaryOp::Not => Ok(Value::Bool(!right.is_truthy())),
    }
}

fn binary(operator: BinaryOp, left: Value, right: Value, line: usize) -> IResult<Value> {
    match operator {
        BinaryOp::Equal => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Bool(left != right)),
        BinaryOp::Add => {
            if let (Value::String(a), Value::String(b)) = (&left, &right) {
                let mut joined: String = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                return Ok(Value::String(Rc::from(joined)));
            }
        }
        _ => {}
    }

    let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
        let message: String = if operator == BinaryOp::Add {
            format!(
                "Operands must be two numbers or two strings, got {} and {}.",
                left.type_name(),
                right.type_name()
            )
        } else {
            format!(
                "Operands must be numbers, got {} and {}.",
                left.type_name(),
                right.type_name()
            )
        };

        return Err(RuntimeError::type_error(line, message));
    };

    let (a, b) = (*a, *b);

    Ok(match operator {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Subtract => Value::Number(a - b),
        BinaryOp::Multiply => Value::Number(a * b),
        BinaryOp::Divide => Value::Number(a / b),
        BinaryOp::Less => Value::Bool(a < b),
        BinaryOp::LessEqual => Value::Bool(a <= b),
        BinaryOp::Greater => Value::Bool(a > b),
        BinaryOp::GreaterEqual => Value::Bool(a >= b),
        BinaryOp::Equal | BinaryOp::NotEqual => unreachable!("equality handled above"),
    })
}
