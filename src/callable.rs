//! Runtime object model: user functions (closures), native functions,
//! classes and instances.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear on the left of `(...)`.
pub trait Callable {
    fn arity(&self) -> usize;

    /// `paren` is the call's closing parenthesis, used to locate errors.
    fn call(&self, interpreter: &mut Interpreter, paren: &Token, arguments: Vec<Value>)
        -> Result<Value>;
}

// ───────────────────────────── user functions ─────────────────────────────

/// A declaration bundled with the scope it was created in.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &str {
        self.declaration.display_name()
    }

    /// A copy of this method whose closure has `this` bound to `instance`.
    pub fn bind(&self, instance: Value) -> Function {
        let mut scope = Environment::with_enclosing(Rc::clone(&self.closure));
        scope.define("this", Some(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: scope.into_ref(),
        }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        _paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling <fn {}>", self.name());

        let mut frame = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            frame.define(&param.lexeme, Some(argument));
        }

        match interpreter.execute_block(&self.declaration.body, frame.into_ref())? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) | Flow::Break => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

// ──────────────────────────── native functions ────────────────────────────

/// Host implementation of a native.  An `Err` becomes a runtime error at the
/// call site.
pub type NativeFn = dyn Fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String>;

/// How many arguments a native accepts.
#[derive(Clone)]
pub enum Arity {
    Fixed(usize),
    /// Asked again on every call.
    Dynamic(Rc<dyn Fn() -> usize>),
}

impl Arity {
    pub fn get(&self) -> usize {
        match self {
            Arity::Fixed(n) => *n,
            Arity::Dynamic(f) => f(),
        }
    }
}

impl fmt::Debug for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "Fixed({})", n),
            Arity::Dynamic(_) => write!(f, "Dynamic"),
        }
    }
}

pub struct NativeFunction {
    name: String,
    arity: Arity,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, arity: Arity, func: F) -> Self
    where
        F: Fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String> + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `clock()`: seconds since the Unix epoch.
    pub fn clock() -> Self {
        Self::new("clock", Arity::Fixed(0), |_, _| {
            let now = chrono::Utc::now();
            Ok(Value::Number(now.timestamp_micros() as f64 / 1_000_000.0))
        })
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity.get()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(interpreter, &arguments).map_err(|message| LoxError::runtime(paren, message))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {} {:?}>", self.name, self.arity)
    }
}

// ─────────────────────────── classes & instances ──────────────────────────

pub struct Class {
    name: String,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(name: impl Into<String>, methods: HashMap<String, Rc<Function>>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_method(&self, name: &str) -> Option<&Rc<Function>> {
        self.methods.get(name)
    }
}

/// Calling a class makes a fresh, field‑less instance.
impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        0
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        _paren: &Token,
        _arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating <class {}>", self.name);

        let instance = Instance {
            class: Rc::clone(self),
            fields: HashMap::new(),
        };

        Ok(Value::Instance(Rc::new(RefCell::new(instance))))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        write!(f, "<class {} {:?}>", self.name, methods)
    }
}

pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Fields shadow methods.  Methods come back bound to `instance`.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            let bound = method.bind(Value::Instance(Rc::clone(instance)));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(LoxError::runtime(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        write!(f, "<instance of {} {:?}>", self.class.name, fields)
    }
}
