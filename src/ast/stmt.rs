//! Statement and pattern AST nodes

use super::expr::Expr;
use super::span::Spanned;
use super::types::TypeExpr;

/// A binding pattern on the left of `let`
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Bind a single name: x
    Identifier(String),
    /// Destructure a tuple: (a, b)
    Tuple(Vec<Spanned<Pattern>>),
}

/// A statement in the language
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Local binding: let x: u8 = 42;
    Let {
        pattern: Spanned<Pattern>,
        ty: Option<Spanned<TypeExpr>>,
        value: Spanned<Expr>,
    },

    /// Assignment: x = 42;
    Assign {
        target: Spanned<Expr>,
        value: Spanned<Expr>,
    },

    /// Expression statement: foo();
    Expr(Spanned<Expr>),

    /// Return statement: return x;
    Return(Option<Spanned<Expr>>),
}

/// A sequence of statements with an optional trailing value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Spanned<Stmt>>,
    pub value: Option<Box<Spanned<Expr>>>,
}

impl Block {
    pub fn new(stmts: Vec<Spanned<Stmt>>) -> Self {
        Self { stmts, value: None }
    }

    pub fn with_value(stmts: Vec<Spanned<Stmt>>, value: Spanned<Expr>) -> Self {
        Self {
            stmts,
            value: Some(Box::new(value)),
        }
    }
}
