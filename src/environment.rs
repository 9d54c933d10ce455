use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures, call frames and the interpreter all
/// hold these; a scope lives as long as its longest holder.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope in the chain.  A `None` value marks a name that is declared but
/// not yet initialized, which is different from a name that is absent.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Option<Value>>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a shareable handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this scope, replacing any previous binding.
    pub fn define(&mut self, name: &str, value: Option<Value>) {
        debug!("define '{}' (initialized: {})", name, value.is_some());

        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        match self.values.get(&name.lexeme) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(uninitialized(name)),
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name),
                None => Err(undefined(name)),
            },
        }
    }

    /// Overwrite an existing binding in this scope or an ancestor.  Never
    /// declares.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = Some(value);
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(undefined(name)),
        }
    }

    /// Read `name` exactly `distance` scopes up from `env`.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
        let scope = Self::ancestor(env, distance);
        let scope = scope.borrow();

        match scope.values.get(&name.lexeme) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(uninitialized(name)),
            None => panic!(
                "resolved '{}' at distance {} but the scope does not declare it",
                name.lexeme, distance
            ),
        }
    }

    /// Write `name` exactly `distance` scopes up from `env`.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) {
        let scope = Self::ancestor(env, distance);
        let mut scope = scope.borrow_mut();

        match scope.values.get_mut(&name.lexeme) {
            Some(slot) => *slot = Some(value),
            None => panic!(
                "resolved '{}' at distance {} but the scope does not declare it",
                name.lexeme, distance
            ),
        }
    }

    fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut scope: EnvRef = Rc::clone(env);

        for hop in 0..distance {
            let parent = scope.borrow().enclosing.clone().unwrap_or_else(|| {
                panic!(
                    "scope chain ended after {} of {} hops",
                    hop, distance
                )
            });
            scope = parent;
        }

        scope
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

fn uninitialized(name: &Token) -> LoxError {
    LoxError::runtime(
        name,
        format!("Declared variable not initialized: '{}'.", name.lexeme),
    )
}
