//! Node kind tags
//!
//! Several nodes can start at the same byte offset (`a + b` starts where
//! `a` does), so per-node tables are keyed by span and kind together.

use super::expr::Expr;
use super::item::Decl;
use super::stmt::Pattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    // Declarations
    Import,
    Export,
    Function,
    TypeDecl,
    Def,
    Global,
    Memory,
    DataSegment,
    Param,
    Return,

    // Expressions
    Binary,
    Unary,
    Cast,
    Annotation,
    Call,
    Member,
    Index,
    Identifier,
    Literal,
    Array,
    If,
    Match,
    Tuple,
    Group,

    // Patterns
    IdentifierPattern,
    TuplePattern,
}

impl Expr {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expr::Binary { .. } => NodeKind::Binary,
            Expr::Unary { .. } => NodeKind::Unary,
            Expr::Cast { .. } => NodeKind::Cast,
            Expr::Annotation { .. } => NodeKind::Annotation,
            Expr::Call { .. } => NodeKind::Call,
            Expr::Member { .. } => NodeKind::Member,
            Expr::Index { .. } => NodeKind::Index,
            Expr::Identifier(_) => NodeKind::Identifier,
            Expr::Literal(_) => NodeKind::Literal,
            Expr::Array(_) => NodeKind::Array,
            Expr::If { .. } => NodeKind::If,
            Expr::Match { .. } => NodeKind::Match,
            Expr::Tuple(_) => NodeKind::Tuple,
            Expr::Group(_) => NodeKind::Group,
        }
    }
}

impl Pattern {
    pub fn kind(&self) -> NodeKind {
        match self {
            Pattern::Identifier(_) => NodeKind::IdentifierPattern,
            Pattern::Tuple(_) => NodeKind::TuplePattern,
        }
    }
}

impl Decl {
    pub fn kind(&self) -> NodeKind {
        match self {
            Decl::Import(_) => NodeKind::Import,
            Decl::Export(_) => NodeKind::Export,
            Decl::Function(_) => NodeKind::Function,
            Decl::Type(_) => NodeKind::TypeDecl,
            Decl::Def(_) => NodeKind::Def,
            Decl::Global(_) => NodeKind::Global,
            Decl::Memory(_) => NodeKind::Memory,
        }
    }
}
