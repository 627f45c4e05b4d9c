//! Resolved Types
//!
//! The closed set of type shapes the checker assigns to nodes, resolved from
//! the AST `TypeExpr`s and from literal inference. Values are immutable once
//! built; the assignability rules live in `assign`.

use std::fmt;

use num_bigint::BigInt;

use crate::ast::{IndexSize, PrimitiveType, Specifier};
use crate::config::CheckConfig;

/// Size of an address in linear memory (wasm32)
pub const POINTER_SIZE: u64 = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(PrimitiveType),
    Pointer(Box<Type>),
    /// Arrays, slices and framed sequences
    Indexed(IndexedType),
    Tuple(Vec<TupleField>),
    Func(FuncType),
    Void,
    /// Integer known only at compile time, with its exact value
    ComptimeInt(BigInt),
    /// Float known only at compile time
    ComptimeFloat(f64),
    /// Array literal whose element types are not yet settled
    ComptimeList(Vec<Type>),
    /// A declared type name, either an alias or a nominal (unique) type
    Named(Box<NamedType>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedType {
    pub element: Box<Type>,
    pub size: IndexSize,
    /// Framing markers, outermost first
    pub specifiers: Vec<Specifier>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleField {
    pub name: Option<String>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub params: Vec<Type>,
    pub returns: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedType {
    pub name: String,
    pub underlying: Type,
    pub unique: bool,
}

/// Why a comptime type could not be given a concrete representation
#[derive(Debug, Clone, PartialEq)]
pub enum ConcretizeError {
    /// An empty list literal has no element type to default to
    EmptyList,
    /// List elements have no common concrete type
    Incoherent { first: String, other: String },
}

impl IndexedType {
    pub fn new(element: Type, size: IndexSize, specifiers: Vec<Specifier>) -> Self {
        Self {
            element: Box::new(element),
            size,
            specifiers,
        }
    }

    /// A runtime slice: no static count and no framing
    pub fn is_slice(&self) -> bool {
        self.size == IndexSize::Slice && self.specifiers.is_empty()
    }

    pub fn is_framed(&self) -> bool {
        !self.specifiers.is_empty()
    }

    /// Fixed count with no framing; stored inline when nested in another array
    pub fn is_inline(&self) -> bool {
        matches!(self.size, IndexSize::Fixed(_)) && self.specifiers.is_empty()
    }

    pub fn fixed_len(&self) -> Option<u64> {
        match self.size {
            IndexSize::Fixed(n) => Some(n),
            _ => None,
        }
    }

    /// The element type when it is itself indexed (looking through aliases)
    pub fn indexed_element(&self) -> Option<&IndexedType> {
        match self.element.unalias() {
            Type::Indexed(inner) => Some(inner),
            _ => None,
        }
    }

    /// Element is an indexed type that is not stored inline, so each child
    /// is placed on its own and the parent holds references to them
    pub fn has_separate_brackets(&self) -> bool {
        self.indexed_element().is_some_and(|inner| !inner.is_inline())
    }
}

impl Type {
    pub fn indexed(element: Type, size: IndexSize, specifiers: Vec<Specifier>) -> Self {
        Type::Indexed(IndexedType::new(element, size, specifiers))
    }

    pub fn named(name: impl Into<String>, underlying: Type, unique: bool) -> Self {
        Type::Named(Box::new(NamedType {
            name: name.into(),
            underlying,
            unique,
        }))
    }

    pub fn tuple(types: Vec<Type>) -> Self {
        Type::Tuple(types.into_iter().map(|ty| TupleField { name: None, ty }).collect())
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Comptime scalars, the only values that cross into a unique type implicitly
    pub fn is_comptime_number(&self) -> bool {
        matches!(self, Type::ComptimeInt(_) | Type::ComptimeFloat(_))
    }

    /// Strip alias wrappers. Unique types are kept.
    pub fn unalias(&self) -> &Type {
        match self {
            Type::Named(named) if !named.unique => named.underlying.unalias(),
            _ => self,
        }
    }

    /// Strip every named wrapper, unique ones included
    pub fn underlying(&self) -> &Type {
        match self {
            Type::Named(named) => named.underlying.underlying(),
            _ => self,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveType> {
        match self.unalias() {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_indexed(&self) -> Option<&IndexedType> {
        match self.unalias() {
            Type::Indexed(ix) => Some(ix),
            _ => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        self.as_primitive().is_some_and(|p| p.is_bool())
    }

    pub fn is_integer(&self) -> bool {
        self.as_primitive().is_some_and(|p| p.is_integer())
    }

    pub fn is_float(&self) -> bool {
        self.as_primitive().is_some_and(|p| p.is_float())
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_signed(&self) -> bool {
        self.as_primitive().is_some_and(|p| p.is_signed())
    }

    pub fn bit_width(&self) -> Option<u32> {
        self.as_primitive().map(|p| p.bits())
    }

    /// Structural equality, looking through alias wrappers at every level.
    /// Unique types compare by name and underlying type.
    pub fn same_as(&self, other: &Type) -> bool {
        match (self.unalias(), other.unalias()) {
            (Type::Named(a), Type::Named(b)) => {
                a.name == b.name && a.unique == b.unique && a.underlying.same_as(&b.underlying)
            }
            (Type::Pointer(a), Type::Pointer(b)) => a.same_as(b),
            (Type::Indexed(a), Type::Indexed(b)) => {
                a.size == b.size && a.specifiers == b.specifiers && a.element.same_as(&b.element)
            }
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.name == y.name && x.ty.same_as(&y.ty))
            }
            (Type::Func(a), Type::Func(b)) => {
                a.params.len() == b.params.len()
                    && a.returns.len() == b.returns.len()
                    && a.params.iter().zip(&b.params).all(|(x, y)| x.same_as(y))
                    && a.returns.iter().zip(&b.returns).all(|(x, y)| x.same_as(y))
            }
            (Type::ComptimeList(a), Type::ComptimeList(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            (a, b) => a == b,
        }
    }

    /// No comptime node remains anywhere inside this type
    pub fn is_concrete(&self) -> bool {
        match self {
            Type::ComptimeInt(_) | Type::ComptimeFloat(_) | Type::ComptimeList(_) => false,
            Type::Primitive(_) | Type::Void => true,
            Type::Pointer(inner) => inner.is_concrete(),
            Type::Indexed(ix) => ix.size != IndexSize::Comptime
                && ix.size != IndexSize::Inferred
                && ix.element.is_concrete(),
            Type::Tuple(fields) => fields.iter().all(|f| f.ty.is_concrete()),
            Type::Func(func) => func
                .params
                .iter()
                .chain(&func.returns)
                .all(Type::is_concrete),
            Type::Named(named) => named.underlying.is_concrete(),
        }
    }

    /// Size of a value of this type in linear memory.
    ///
    /// Framed sequences are referenced through a pointer and slices are a
    /// pointer/length pair. Comptime types and unresolved sizes have none.
    pub fn byte_size(&self) -> Option<u64> {
        match self {
            Type::Primitive(p) => Some(p.size_bytes() as u64),
            Type::Pointer(_) => Some(POINTER_SIZE),
            Type::Func(_) => Some(POINTER_SIZE),
            Type::Void => Some(0),
            Type::Indexed(ix) => {
                if ix.is_framed() {
                    return Some(POINTER_SIZE);
                }
                match ix.size {
                    IndexSize::Fixed(n) => ix.element.byte_size().map(|size| size * n),
                    IndexSize::Slice => Some(POINTER_SIZE * 2),
                    IndexSize::Comptime | IndexSize::Inferred => None,
                }
            }
            Type::Tuple(fields) => fields.iter().map(|f| f.ty.byte_size()).sum(),
            Type::Named(named) => named.underlying.byte_size(),
            Type::ComptimeInt(_) | Type::ComptimeFloat(_) | Type::ComptimeList(_) => None,
        }
    }

    /// Replace comptime nodes with concrete types using the configured defaults.
    ///
    /// Overflow is not checked here; the caller validates the value against
    /// the chosen type with the assignability rules.
    pub fn concretize(&self, config: &CheckConfig) -> Result<Type, ConcretizeError> {
        match self {
            Type::ComptimeInt(_) => Ok(Type::Primitive(config.default_int)),
            Type::ComptimeFloat(_) => Ok(Type::Primitive(config.default_float)),
            Type::ComptimeList(elements) => {
                let element = concretize_elements(elements, config)?;
                Ok(Type::indexed(
                    element,
                    IndexSize::Fixed(elements.len() as u64),
                    Vec::new(),
                ))
            }
            Type::Pointer(inner) => Ok(Type::Pointer(Box::new(inner.concretize(config)?))),
            Type::Indexed(ix) => Ok(Type::Indexed(IndexedType {
                element: Box::new(ix.element.concretize(config)?),
                size: ix.size,
                specifiers: ix.specifiers.clone(),
            })),
            Type::Tuple(fields) => fields
                .iter()
                .map(|f| {
                    Ok(TupleField {
                        name: f.name.clone(),
                        ty: f.ty.concretize(config)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Type::Tuple),
            Type::Primitive(_) | Type::Void | Type::Func(_) | Type::Named(_) => Ok(self.clone()),
        }
    }

    /// Format the type in a user-friendly way for error messages
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

/// Pick one concrete element type for a list literal.
///
/// Comptime numbers follow a concrete numeric sibling when there is one.
/// Otherwise mixed int/float elements default to the float type. Strings of
/// different lengths settle on a slice of their element.
fn concretize_elements(elements: &[Type], config: &CheckConfig) -> Result<Type, ConcretizeError> {
    let has_float = elements.iter().any(|e| matches!(e, Type::ComptimeFloat(_)));
    let anchor = elements
        .iter()
        .find(|e| e.as_primitive().is_some_and(|p| !p.is_bool()));
    let mut merged: Option<Type> = None;

    for element in elements {
        let concrete = match (element, anchor) {
            (Type::ComptimeInt(_) | Type::ComptimeFloat(_), Some(anchor)) => anchor.clone(),
            (Type::ComptimeInt(_), None) if has_float => Type::Primitive(config.default_float),
            (other, _) => other.concretize(config)?,
        };
        merged = Some(match merged {
            None => concrete,
            Some(prev) => merge_element(prev, concrete)?,
        });
    }

    merged.ok_or(ConcretizeError::EmptyList)
}

fn merge_element(prev: Type, next: Type) -> Result<Type, ConcretizeError> {
    if prev.same_as(&next) {
        return Ok(prev);
    }
    if let (Type::Indexed(a), Type::Indexed(b)) = (prev.unalias(), next.unalias())
        && a.specifiers == b.specifiers
        && a.element.same_as(&b.element)
    {
        return Ok(Type::indexed(
            (*a.element).clone(),
            IndexSize::Slice,
            a.specifiers.clone(),
        ));
    }
    Err(ConcretizeError::Incoherent {
        first: prev.display_name(),
        other: next.display_name(),
    })
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{}", p),
            Type::Pointer(inner) => write!(f, "*{}", inner),
            Type::Indexed(ix) => {
                write!(f, "[{}", ix.element)?;
                match ix.size {
                    IndexSize::Fixed(n) => write!(f, "; {}", n)?,
                    IndexSize::Comptime => f.write_str("; comptime")?,
                    IndexSize::Inferred => f.write_str("; _")?,
                    IndexSize::Slice => {}
                }
                for spec in &ix.specifiers {
                    write!(f, "{}", spec)?;
                }
                f.write_str("]")
            }
            Type::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(name) = &field.name {
                        write!(f, "{}: ", name)?;
                    }
                    write!(f, "{}", field.ty)?;
                }
                f.write_str(")")
            }
            Type::Func(func) => {
                let params = func.params.iter().map(Type::to_string).collect::<Vec<_>>();
                let returns = func.returns.iter().map(Type::to_string).collect::<Vec<_>>();
                write!(f, "fn({}) -> ({})", params.join(", "), returns.join(", "))
            }
            Type::Void => f.write_str("void"),
            Type::ComptimeInt(v) => write!(f, "int({})", v),
            Type::ComptimeFloat(v) => write!(f, "float({})", v),
            Type::ComptimeList(elements) => {
                let elements = elements.iter().map(Type::to_string).collect::<Vec<_>>();
                write!(f, "list({})", elements.join(", "))
            }
            Type::Named(named) => f.write_str(&named.name),
        }
    }
}
