//! Expression AST nodes

use num_bigint::BigInt;

use super::span::Spanned;
use super::stmt::Block;
use super::types::TypeExpr;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,

    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation: -x
    Neg,
    /// Bitwise NOT: ~x
    BitNot,
    /// Logical NOT: !x
    Not,
    /// Dereference: *ptr
    Deref,
    /// Address-of: &x
    AddrOf,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "!",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
        }
    }
}

/// A literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Integer literal of arbitrary precision
    Int(BigInt),
    Float(f64),
    Bool(bool),
    /// String literal with escapes already resolved
    String(Vec<u8>),
}

/// A field of a tuple expression, optionally named: (x: 1, 2)
#[derive(Debug, Clone, PartialEq)]
pub struct TupleFieldInit {
    pub name: Option<Spanned<String>>,
    pub value: Spanned<Expr>,
}

/// Pattern of a match arm
#[derive(Debug, Clone, PartialEq)]
pub enum MatchPattern {
    /// A constant to compare against: 1, "a", true
    Value(Spanned<Expr>),
    /// `_`
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: MatchPattern,
    pub body: Spanned<Expr>,
}

/// An expression in the language
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinaryOp,
        right: Box<Spanned<Expr>>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Spanned<Expr>>,
    },

    /// Explicit conversion: x as u16
    Cast {
        expr: Box<Spanned<Expr>>,
        target: Spanned<TypeExpr>,
    },

    /// Contextual typing: x: u16
    Annotation {
        expr: Box<Spanned<Expr>>,
        ty: Spanned<TypeExpr>,
    },

    Call {
        callee: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },

    /// Tuple field or indexed length access: pair.x, pair.0, s.len
    Member {
        object: Box<Spanned<Expr>>,
        member: Spanned<String>,
    },

    Index {
        object: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },

    Identifier(String),

    Literal(Literal),

    /// Array literal: [1, 2, 3]
    Array(Vec<Spanned<Expr>>),

    If {
        condition: Box<Spanned<Expr>>,
        then_branch: Block,
        else_branch: Option<Block>,
    },

    Match {
        scrutinee: Box<Spanned<Expr>>,
        arms: Vec<MatchArm>,
    },

    Tuple(Vec<TupleFieldInit>),

    /// Parenthesized expression
    Group(Box<Spanned<Expr>>),
}

impl Expr {
    pub fn int(value: impl Into<BigInt>) -> Self {
        Expr::Literal(Literal::Int(value.into()))
    }

    pub fn float(value: f64) -> Self {
        Expr::Literal(Literal::Float(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Literal(Literal::Bool(value))
    }

    pub fn string(value: impl AsRef<[u8]>) -> Self {
        Expr::Literal(Literal::String(value.as_ref().to_vec()))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn binary(left: Spanned<Expr>, op: BinaryOp, right: Spanned<Expr>) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Spanned<Expr>) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// String, array and tuple literals: the nodes that may be placed in linear memory
    pub fn is_aggregate_literal(&self) -> bool {
        matches!(
            self,
            Expr::Literal(Literal::String(_)) | Expr::Array(_) | Expr::Tuple(_)
        )
    }
}
