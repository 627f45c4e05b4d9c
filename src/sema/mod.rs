//! Semantic Analysis module
//!
//! This module is responsible for:
//! - Symbol resolution (mapping names to declarations)
//! - Type checking and comptime concretization
//! - Constant expression evaluation
//! - Collecting the literals that must be placed in linear memory

pub mod analyze;
pub mod assign;
pub mod const_eval;
pub mod table;
pub mod types;

use rustc_hash::FxHashMap as HashMap;

use crate::ast::{Expr, NodeKind, SourceFile, Span, Spanned};
use crate::config::CheckConfig;
use crate::data::{LiteralId, LiteralValue, QualifiedLiteral};
use analyze::SemanticAnalyzer;
use table::SymbolTable;
use types::{IndexedType, Type};

#[derive(Debug, Clone, PartialEq)]
pub enum SemaError {
    /// Symbol not found in scope
    UndefinedSymbol {
        name: String,
        span: Span,
    },

    /// Value does not fit the expected type
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    /// Call argument does not fit its parameter
    ArgumentMismatch {
        index: usize,
        expected: String,
        found: String,
        span: Span,
    },

    /// Function call with wrong number of arguments
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },

    /// Comptime value outside the range of its target type
    ConstantOverflow {
        value: String,
        ty: String,
        span: Span,
    },

    /// No concrete type can be chosen for a value
    CannotInfer {
        reason: String,
        span: Span,
    },

    /// Invalid operation for given types
    InvalidBinaryOp {
        op: String,
        left_ty: String,
        right_ty: String,
        span: Span,
    },

    /// Invalid unary operation for type
    InvalidUnaryOp {
        op: String,
        operand_ty: String,
        span: Span,
    },

    /// No explicit conversion exists between the two types
    InvalidCast {
        from: String,
        to: String,
        span: Span,
    },

    /// Attempting to assign to an immutable binding
    ImmutableAssignment {
        symbol: String,
        span: Span,
    },

    /// Duplicate symbol definition
    DuplicateSymbol {
        name: String,
        span: Span,
        previous_span: Option<Span>,
    },

    /// Call on a value that is not a function
    NotCallable {
        ty: String,
        span: Span,
    },

    /// Field not found in tuple or indexed type
    FieldNotFound {
        ty: String,
        field: String,
        span: Span,
    },

    /// Constant index past the end of a fixed-size array
    IndexOutOfBounds {
        index: String,
        len: u64,
        span: Span,
    },

    /// Generic error with custom message
    Custom {
        message: String,
        span: Span,
    },
}

impl SemaError {
    pub fn span(&self) -> Span {
        match self {
            SemaError::UndefinedSymbol { span, .. }
            | SemaError::TypeMismatch { span, .. }
            | SemaError::ArgumentMismatch { span, .. }
            | SemaError::ArityMismatch { span, .. }
            | SemaError::ConstantOverflow { span, .. }
            | SemaError::CannotInfer { span, .. }
            | SemaError::InvalidBinaryOp { span, .. }
            | SemaError::InvalidUnaryOp { span, .. }
            | SemaError::InvalidCast { span, .. }
            | SemaError::ImmutableAssignment { span, .. }
            | SemaError::DuplicateSymbol { span, .. }
            | SemaError::NotCallable { span, .. }
            | SemaError::FieldNotFound { span, .. }
            | SemaError::IndexOutOfBounds { span, .. }
            | SemaError::Custom { span, .. } => *span,
        }
    }

    /// Byte offset of the offending node
    pub fn offset(&self) -> usize {
        self.span().start
    }

    /// The diagnostic text without position information
    pub fn message(&self) -> String {
        match self {
            SemaError::UndefinedSymbol { name, .. } => format!("undefined symbol '{}'", name),
            SemaError::TypeMismatch { expected, found, .. } => {
                format!("type mismatch: expected {}, found {}", expected, found)
            }
            SemaError::ArgumentMismatch {
                index,
                expected,
                found,
                ..
            } => format!(
                "argument {} has the wrong type: expected {}, found {}",
                index + 1,
                expected,
                found
            ),
            SemaError::ArityMismatch { expected, found, .. } => {
                format!("expected {} argument(s), found {}", expected, found)
            }
            SemaError::ConstantOverflow { value, ty, .. } => {
                format!("constant value {} does not fit in type {}", value, ty)
            }
            SemaError::CannotInfer { reason, .. } => format!("cannot infer type: {}", reason),
            SemaError::InvalidBinaryOp {
                op,
                left_ty,
                right_ty,
                ..
            } => format!("cannot apply '{}' to types {} and {}", op, left_ty, right_ty),
            SemaError::InvalidUnaryOp { op, operand_ty, .. } => {
                format!("cannot apply '{}' to type {}", op, operand_ty)
            }
            SemaError::InvalidCast { from, to, .. } => {
                format!("cannot cast {} to {}", from, to)
            }
            SemaError::ImmutableAssignment { symbol, .. } => {
                format!("cannot assign to immutable binding '{}'", symbol)
            }
            SemaError::DuplicateSymbol { name, .. } => format!("duplicate symbol '{}'", name),
            SemaError::NotCallable { ty, .. } => format!("value of type {} is not callable", ty),
            SemaError::FieldNotFound { ty, field, .. } => {
                format!("no field '{}' on type {}", field, ty)
            }
            SemaError::IndexOutOfBounds { index, len, .. } => {
                format!("index {} is out of bounds for length {}", index, len)
            }
            SemaError::Custom { message, .. } => message.clone(),
        }
    }

    /// Format error with source code context showing the actual line and error marker
    pub fn format_with_source(&self, source: &str) -> String {
        self.format_with_source_and_file(source, None)
    }

    /// Format error with source code context and filename
    pub fn format_with_source_and_file(&self, source: &str, filename: Option<&str>) -> String {
        let msg = match self {
            SemaError::DuplicateSymbol {
                name,
                previous_span: Some(prev),
                ..
            } => format!(
                "duplicate symbol '{}' (previously defined at {})",
                name,
                prev.format_position(source)
            ),
            _ => self.message(),
        };
        format!(
            "error: {}\n{}",
            msg,
            self.span().format_error_context(source, filename, &msg)
        )
    }
}

impl std::fmt::Display for SemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let span = self.span();
        write!(f, "{} at {}..{}", self.message(), span.start, span.end)
    }
}

impl std::error::Error for SemaError {}

/// Identity of a typed node.
///
/// The span disambiguates nested nodes of the same kind that share a start
/// offset, such as the two `Member` nodes in `a.b.c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey {
    pub span: Span,
    pub kind: NodeKind,
}

impl TypeKey {
    pub fn new(span: Span, kind: NodeKind) -> Self {
        Self { span, kind }
    }

    pub fn of_expr(expr: &Spanned<Expr>) -> Self {
        Self::new(expr.span, expr.node.kind())
    }

    pub fn offset(&self) -> usize {
        self.span.start
    }
}

/// Resolved type of every type-bearing node
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    types: HashMap<TypeKey, Type>,
}

impl TypeMap {
    pub fn insert(&mut self, key: TypeKey, ty: Type) {
        self.types.insert(key, ty);
    }

    pub fn get(&self, span: Span, kind: NodeKind) -> Option<&Type> {
        self.types.get(&TypeKey::new(span, kind))
    }

    pub fn get_expr(&self, expr: &Spanned<Expr>) -> Option<&Type> {
        self.types.get(&TypeKey::of_expr(expr))
    }

    /// First entry at `offset` with the given kind, for callers that only track offsets
    pub fn at_offset(&self, offset: usize, kind: NodeKind) -> Option<&Type> {
        self.types
            .iter()
            .filter(|(key, _)| key.span.start == offset && key.kind == kind)
            .min_by_key(|(key, _)| key.span.end)
            .map(|(_, ty)| ty)
    }

    pub fn remove(&mut self, key: &TypeKey) -> Option<Type> {
        self.types.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &Type)> {
        self.types.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&TypeKey, &mut Type)> {
        self.types.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// A literal the code generator needs in linear memory
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLiteral {
    pub id: LiteralId,
    /// Node the literal was produced from
    pub key: TypeKey,
    pub ty: IndexedType,
    pub value: LiteralValue,
    /// Explicit placement from a `memory` data segment
    pub address: Option<u32>,
}

/// Everything the checker produces for one module
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub types: TypeMap,
    pub table: SymbolTable,
    pub errors: Vec<SemaError>,
    pub literals: Vec<PendingLiteral>,
}

impl CheckResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn type_of(&self, expr: &Spanned<Expr>) -> Option<&Type> {
        self.types.get_expr(expr)
    }

    /// Literal recorded for a node, if any
    pub fn literal_at(&self, key: TypeKey) -> Option<&PendingLiteral> {
        self.literals.iter().find(|lit| lit.key == key)
    }

    /// Input for the data layout engine
    pub fn qualified_literals(&self) -> Vec<QualifiedLiteral> {
        self.literals
            .iter()
            .map(|lit| QualifiedLiteral {
                id: lit.id,
                value: lit.value.clone(),
                ty: lit.ty.clone(),
                address: lit.address,
            })
            .collect()
    }
}

pub fn check(ast: &SourceFile) -> CheckResult {
    check_with_config(ast, &CheckConfig::default())
}

#[tracing::instrument(level = "debug", skip_all, fields(items = ast.items.len()))]
pub fn check_with_config(ast: &SourceFile, config: &CheckConfig) -> CheckResult {
    let mut analyzer = SemanticAnalyzer::new(config.clone());
    let result = analyzer.analyze(ast);
    tracing::debug!(
        errors = result.errors.len(),
        literals = result.literals.len(),
        "checked module"
    );
    result
}
