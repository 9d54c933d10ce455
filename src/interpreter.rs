//! Tree‑walking evaluator.
//!
//! Statements return a [`Flow`] so `return` and `break` travel up the Rust
//! call stack as ordinary values; only the handler each one targets (call
//! boundary, nearest `while`) stops it.  Runtime errors travel as `Err` and
//! end the whole run.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{Class, Function, Instance, NativeFunction};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fell through.  Carries the value of an expression statement, `nil`
    /// for every other statement.
    Normal(Value),

    /// Unwinding to the enclosing call.
    Return(Value),

    /// Unwinding to the nearest loop.
    Break,
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Scope distances recorded by the resolver.  Absent ⇒ global.
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

impl Interpreter {
    /// Creates a new Interpreter printing to `out`, with the default natives
    /// (`clock`) already defined.
    pub fn new(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        };

        interpreter.define_native(NativeFunction::clock());

        interpreter
    }

    /// Put a native into the global scope.
    pub fn define_native(&mut self, native: NativeFunction) {
        debug!("Defining native function '{}'", native.name());

        let name: String = native.name().to_string();

        self.globals
            .borrow_mut()
            .define(&name, Some(Value::Native(Rc::new(native))));
    }

    /// Called by the resolver for every local name reference.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        debug!("Noting {:?} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Runs a program.  Returns the value of the last statement if it was an
    /// expression statement, `nil` otherwise.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<Value> {
        debug!("Interpreting {} statements", statements.len());

        let mut last: Value = Value::Nil;

        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal(value) => last = value,
                // Rejected statically; nothing to unwind to at the top.
                Flow::Return(_) | Flow::Break => last = Value::Nil,
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");

        Ok(last)
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => Ok(Flow::Normal(self.evaluate(expr)?)),

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.out, "{}", value)?;

                debug!("Printed value: {}", value);

                Ok(Flow::Normal(Value::Nil))
            }

            Stmt::Var { name, initializer } => {
                let value: Option<Value> = match initializer {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None,
                };

                debug!("Defining variable '{}'", name.lexeme);

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal(Value::Nil))
            }

            Stmt::Block(statements) => {
                let scope: EnvRef =
                    Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();

                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal(Value::Nil))
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal(_) => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                debug!("Exited while loop");

                Ok(Flow::Normal(Value::Nil))
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Function(declaration) => {
                let function = Function::new(Rc::clone(declaration), Rc::clone(&self.environment));

                debug!("Defining function '{}'", function.name());

                self.environment.borrow_mut().define(
                    declaration.display_name(),
                    Some(Value::Function(Rc::new(function))),
                );

                Ok(Flow::Normal(Value::Nil))
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => {
                let methods: HashMap<String, Rc<Function>> = methods
                    .iter()
                    .map(|method| {
                        let function =
                            Function::new(Rc::clone(method), Rc::clone(&self.environment));
                        (method.display_name().to_string(), Rc::new(function))
                    })
                    .collect();

                debug!("Defining class '{}' with {} methods", name.lexeme, methods.len());

                let class = Class::new(name.lexeme.clone(), methods);

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Some(Value::Class(Rc::new(class))));

                Ok(Flow::Normal(Value::Nil))
            }
        }
    }

    /// Runs `statements` in `scope`, restoring the current scope afterwards
    /// whatever the outcome.
    pub fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, scope);

        let mut outcome: Result<Flow> = Ok(Flow::Normal(Value::Nil));

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal(_)) => {}
                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;

        outcome
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
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

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                let Some(callable) = callee.callable() else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                let arity: usize = callable.arity();
                if values.len() != arity {
                    return Err(LoxError::runtime(
                        paren,
                        format!("Expected {} arguments but got {}.", arity, values.len()),
                    ));
                }

                callable.call(self, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Function(declaration) => {
                let function = Function::new(Rc::clone(declaration), Rc::clone(&self.environment));

                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        // Left before right, always.
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        debug!("Binary {} on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::COMMA => Ok(right),

            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::from(format!("{}{}", a, b))),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::SLASH => {
                if right == Value::Number(0.0) {
                    return Err(LoxError::DivideByZero {
                        line: operator.line,
                    });
                }

                let (a, b) = numbers(operator, &left, &right)?;
                Ok(Value::Number(a / b))
            }

            TokenType::MINUS => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a - b)),
            TokenType::STAR => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a * b)),
            TokenType::PERCENT => {
                numbers(operator, &left, &right).map(|(a, b)| Value::Number(a % b))
            }

            TokenType::GREATER => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => {
                numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a >= b))
            }
            TokenType::LESS => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a < b)),
            TokenType::LESS_EQUAL => {
                numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }
}

fn numbers(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
    }
}
