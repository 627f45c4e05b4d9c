//! Abstract Syntax Tree (AST)
//!
//! The node shapes produced by the parser. Every node carries a byte-offset
//! span; the checker and the layout engine depend only on these shapes.

mod expr;
mod item;
mod kind;
mod span;
mod stmt;
mod types;
pub mod visit;

// Re-export all public types
pub use expr::{BinaryOp, Expr, Literal, MatchArm, MatchPattern, TupleFieldInit, UnaryOp};
pub use item::{
    DataSegment, Decl, Def, Export, FnParam, FnReturn, Function, Global, Import, ImportItem,
    Memory, SourceFile, TypeDecl,
};
pub use kind::NodeKind;
pub use span::{LineCol, Span, Spanned};
pub use stmt::{Block, Pattern, Stmt};
pub use types::{IndexSize, PrefixWidth, PrimitiveType, Specifier, TupleFieldExpr, TypeExpr};
