use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, Function, INITIALIZER};
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// A class value: method tables plus an optional superclass.
pub struct Class {
    name: String,
    superclass: Option<Rc<Class>>,

    /// Instance methods, bound to `this` on access.
    methods: HashMap<String, Function>,

    /// Methods called on the class itself; they never see `this`.
    class_methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Function>,
        class_methods: HashMap<String, Function>,
    ) -> Self {
        Class {
            name,
            superclass,
            methods,
            class_methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look an instance method up here, then along the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<&Function> {
        self.methods
            .get(name)
            .or_else(|| self.superclass.as_ref()?.find_method(name))
    }

    /// Look a class‑level method up here, then along the superclass chain.
    pub fn find_class_method(&self, name: &str) -> Option<&Function> {
        self.class_methods
            .get(name)
            .or_else(|| self.superclass.as_ref()?.find_class_method(name))
    }
}

/// Calling a class constructs an instance and runs `init` on it, if any.
impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, Callable::arity)
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Constructing instance of '{}'", self.name);

        let instance: Rc<RefCell<Instance>> = Rc::new(RefCell::new(Instance::new(Rc::clone(self))));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments, line)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|c| c.name()))
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("class_methods", &self.class_methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// An object created by calling a class.  Fields are created on first
/// assignment; there are no field declarations.
pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Fields shadow methods.  Methods come back bound to `instance`.
    pub fn get(
        instance: &Rc<RefCell<Instance>>,
        name: &str,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(name) {
            return Ok(value.clone());
        }

        match this.class.find_method(name) {
            Some(method) => Ok(Value::Callable(Rc::new(method.bind(Rc::clone(instance))))),
            None => Err(RuntimeError::UndefinedProperty {
                name: name.to_string(),
                line,
            }),
        }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

/// Fields can hold the instance itself, so they are not printed.
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
