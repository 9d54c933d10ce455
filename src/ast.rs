//! **Abstract syntax tree** for Rox programs.
//!
//! Two closed families, [`Expr`] and [`Stmt`].  Every pass (resolver,
//! interpreter, printers) matches on them exhaustively.  Nodes own their
//! children; function declarations sit behind an `Rc` so closures can share
//! them with the tree.
//!
//! Nodes the resolver annotates (`Variable`, `Assign`, `This`) carry an
//! [`ExprId`] handed out by the parser, which is the key of the interpreter's
//! locals map.  Two structurally equal references in different places get
//! different ids.

use std::rc::Rc;

use crate::token::Token;

/// Identity of a name‑referencing expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Str(String),
    True,
    False,
    Nil,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// Prefix `!` or `-`.
    Unary { operator: Token, right: Box<Expr> },

    /// Infix arithmetic, comparison, equality and comma operators.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Variable { id: ExprId, name: Token },

    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This { id: ExprId, keyword: Token },

    /// Inline function: `fun (a, b) { … }`.
    Function(Rc<FunctionDecl>),
}

/// Parameters and body shared by named declarations, methods and inline
/// functions.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` for inline functions.
    pub name: Option<Token>,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    pub fn display_name(&self) -> &str {
        self.name
            .as_ref()
            .map(|t| t.lexeme.as_str())
            .unwrap_or("(anonymous)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),

    Print(Expr),

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// Also the target of `for` desugaring.
    While { condition: Expr, body: Box<Stmt> },

    Break(Token),

    Function(Rc<FunctionDecl>),

    Return {
        keyword: Token,
        value: Option<Expr>,
    },

    Class {
        name: Token,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
