//! Runtime scope frames.
//!
//! Frames form a parent‑linked chain ending at the global frame.  Each frame
//! is shared (`Rc<RefCell<_>>`) between the call that created it, the child
//! frames below it and any closure captured while it was current, and is
//! dropped with its last referrer.  A frame is only ever given a parent at
//! creation time, so the chain cannot form a cycle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::error::RuntimeError;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A frame with no parent: the global frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a frame for sharing.
    pub fn shared(self) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<&Rc<RefCell<Environment>>> {
        self.enclosing.as_ref()
    }

    /// Bind `name` in this frame.  Rebinding an existing name overwrites it.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame only.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Overwrite `name` in this frame only.  Returns `false` when absent.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The frame `depth` links above `env` (`0` is `env` itself).
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..depth {
            let parent: Rc<RefCell<Environment>> = frame.borrow().enclosing.clone()?;
            frame = parent;
        }

        Some(frame)
    }

    /// The outermost frame of the chain containing `env`.
    pub fn global(env: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        let mut frame: Rc<RefCell<Environment>> = Rc::clone(env);

        loop {
            let parent: Option<Rc<RefCell<Environment>>> = frame.borrow().enclosing.clone();
            match parent {
                Some(parent) => frame = parent,
                None => return frame,
            }
        }
    }

    /// Read `name` from exactly `depth` frames above `env`.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        trace!("get_at depth={} name='{}'", depth, name);

        let frame: Rc<RefCell<Environment>> =
            Self::ancestor(env, depth).ok_or_else(|| undefined(name, line))?;
        let value: Option<Value> = frame.borrow().get(name);

        value.ok_or_else(|| undefined(name, line))
    }

    /// Write `name` in exactly `depth` frames above `env`.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<(), RuntimeError> {
        trace!("assign_at depth={} name='{}'", depth, name);

        let frame: Rc<RefCell<Environment>> =
            Self::ancestor(env, depth).ok_or_else(|| undefined(name, line))?;
        let assigned: bool = frame.borrow_mut().assign(name, value);

        if assigned {
            Ok(())
        } else {
            Err(undefined(name, line))
        }
    }

    /// Read `name` from the global frame only.
    pub fn get_global(
        env: &Rc<RefCell<Environment>>,
        name: &str,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        trace!("get_global name='{}'", name);

        let global: Rc<RefCell<Environment>> = Self::global(env);
        let value: Option<Value> = global.borrow().get(name);

        value.ok_or_else(|| undefined(name, line))
    }

    /// Write `name` in the global frame only.  The name must already exist.
    pub fn assign_global(
        env: &Rc<RefCell<Environment>>,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<(), RuntimeError> {
        trace!("assign_global name='{}'", name);

        let global: Rc<RefCell<Environment>> = Self::global(env);
        let assigned: bool = global.borrow_mut().assign(name, value);

        if assigned {
            Ok(())
        } else {
            Err(undefined(name, line))
        }
    }
}

fn undefined(name: &str, line: usize) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: name.to_string(),
        line,
    }
}
