//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! All stages (scanner, parser, resolver, runtime, CLI) convert their failure
//! modes into one of the variants defined here.  Static stages never abort on
//! the first problem: they hand each error to an [`ErrorReporter`] and keep
//! going, while runtime errors unwind the whole run through `Result`.
//!
//! The module **does not** print diagnostics itself.

use std::fmt;
use std::io;

use log::info;
use thiserror::Error;

use crate::token::{Token, TokenType};

/// Where on a line a static error points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Where {
    /// No token available (scanner errors).
    Nowhere,

    /// The offending token was the end‑of‑file marker.
    End,

    /// The offending token's lexeme.
    Lexeme(String),
}

impl Where {
    pub fn of(token: &Token) -> Self {
        if token.token_type == TokenType::EOF {
            Where::End
        } else {
            Where::Lexeme(token.lexeme.clone())
        }
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Where::Nowhere => Ok(()),
            Where::End => write!(f, " at end"),
            Where::Lexeme(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

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
    #[error("[line {line}] Error{at}: {message}")]
    Parse {
        message: String,
        line: usize,
        at: Where,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{at}: {message}")]
    Resolve {
        message: String,
        line: usize,
        at: Where,
    },

    /// Runtime evaluation error.  Aborts the whole run.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// `/` with a zero right operand.
    #[error("Cannot divide by zero.\n[line {line}]")]
    DivideByZero { line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Malformed lexer configuration blob.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            at: Where::of(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            at: Where::of(token),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Scan, parse and resolve errors: the program must not be executed.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }

    /// Errors raised while the program was running.
    pub fn is_runtime(&self) -> bool {
        matches!(self, LoxError::Runtime { .. } | LoxError::DivideByZero { .. })
    }

    /// The message without location decoration, when there is one.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            LoxError::DivideByZero { .. } => "Cannot divide by zero.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// The sink every stage reports its problems to.
pub trait ErrorReporter {
    fn report(&mut self, error: LoxError);
}

/// Collecting [`ErrorReporter`] used by the driver.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LoxError> {
        self.errors
    }
}

impl ErrorReporter for Diagnostics {
    fn report(&mut self, error: LoxError) {
        info!("Reported: {}", error);

        self.errors.push(error);
    }
}
