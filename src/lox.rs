//! One interpreter session: scan → parse → resolve → interpret.
//!
//! A [`Lox`] keeps its interpreter between [`Lox::run`] calls, so globals
//! defined by one source are visible to the next (the REPL relies on this).

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::Stmt;
use crate::callable::{Arity, NativeFunction};
use crate::config::LexerConfig;
use crate::error::{Diagnostics, LoxError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::value::Value;

/// Outcome of a single [`Lox::run`].
#[derive(Debug, Default)]
pub struct RunReport {
    /// Value of the final statement, when it was an expression statement and
    /// the program ran to completion.
    pub value: Option<Value>,

    /// Every static error, or the single runtime error that stopped the run.
    pub errors: Vec<LoxError>,
}

impl RunReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The program was rejected before execution.
    pub fn had_static_error(&self) -> bool {
        self.errors.iter().any(LoxError::is_static)
    }

    pub fn had_runtime_error(&self) -> bool {
        self.errors.iter().any(LoxError::is_runtime)
    }

    /// Process exit status: 65 when the program was rejected, 70 when it
    /// failed while running (output errors included), 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.had_static_error() {
            65
        } else if self.is_ok() {
            0
        } else {
            70
        }
    }
}

pub struct Lox {
    config: LexerConfig,
    interpreter: Interpreter,
    next_id: usize,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Default token tables, printing to stdout.
    pub fn new() -> Self {
        Self::with_output(LexerConfig::default(), Box::new(io::stdout()))
    }

    pub fn with_output(config: LexerConfig, out: Box<dyn Write>) -> Self {
        Self {
            config,
            interpreter: Interpreter::new(out),
            next_id: 0,
        }
    }

    /// Make a host function callable from scripts under `name`.
    pub fn register_native<F>(&mut self, name: &str, arity: Arity, func: F)
    where
        F: Fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String> + 'static,
    {
        self.interpreter
            .define_native(NativeFunction::new(name, arity, func));
    }

    /// Run one source text.  Nothing executes if any static stage reported
    /// an error.
    pub fn run(&mut self, source: &str) -> RunReport {
        info!("Running {} bytes of source", source.len());

        let mut diagnostics = Diagnostics::new();

        let tokens = Scanner::new(source, &self.config).scan_tokens(&mut diagnostics);

        let statements: Vec<Stmt> = {
            let mut parser = Parser::new(&tokens, &mut diagnostics).with_first_id(self.next_id);
            let statements = parser.parse();
            self.next_id = parser.next_id();
            statements
        };

        if diagnostics.has_errors() {
            debug!("Stopping after parse: {} errors", diagnostics.errors().len());

            return RunReport {
                value: None,
                errors: diagnostics.into_errors(),
            };
        }

        Resolver::new(&mut self.interpreter, &mut diagnostics).resolve(&statements);

        if diagnostics.has_errors() {
            debug!("Stopping after resolve: {} errors", diagnostics.errors().len());

            return RunReport {
                value: None,
                errors: diagnostics.into_errors(),
            };
        }

        match self.interpreter.interpret(&statements) {
            Ok(value) => RunReport {
                value: matches!(statements.last(), Some(Stmt::Expression(_))).then_some(value),
                errors: Vec::new(),
            },
            Err(e) => {
                debug!("Runtime error: {}", e);

                RunReport {
                    value: None,
                    errors: vec![e],
                }
            }
        }
    }
}

/// A `Write` sink whose contents stay readable after it is handed off.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

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

/// Run `source` in a fresh session and return what it printed.
pub fn run_capturing(source: &str) -> (String, RunReport) {
    let buffer = SharedBuffer::new();
    let mut lox = Lox::with_output(LexerConfig::default(), Box::new(buffer.clone()));

    let report = lox.run(source);

    (buffer.contents(), report)
}
