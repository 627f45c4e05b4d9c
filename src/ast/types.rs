//! Type expressions and the primitive vocabulary shared with the type model

use std::fmt;

use num_bigint::BigInt;

use super::span::Spanned;

/// Primitive types supported by the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    I128,
    U128,
    I256,
    U256,
    I512,
    U512,
    F32,
    F64,
    Bool,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 17] = [
        PrimitiveType::I8,
        PrimitiveType::U8,
        PrimitiveType::I16,
        PrimitiveType::U16,
        PrimitiveType::I32,
        PrimitiveType::U32,
        PrimitiveType::I64,
        PrimitiveType::U64,
        PrimitiveType::I128,
        PrimitiveType::U128,
        PrimitiveType::I256,
        PrimitiveType::U256,
        PrimitiveType::I512,
        PrimitiveType::U512,
        PrimitiveType::F32,
        PrimitiveType::F64,
        PrimitiveType::Bool,
    ];

    /// Look up a primitive by its source spelling (`u8`, `f64`, `bool`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::I8 => "i8",
            PrimitiveType::U8 => "u8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::U16 => "u16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::U32 => "u32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::U64 => "u64",
            PrimitiveType::I128 => "i128",
            PrimitiveType::U128 => "u128",
            PrimitiveType::I256 => "i256",
            PrimitiveType::U256 => "u256",
            PrimitiveType::I512 => "i512",
            PrimitiveType::U512 => "u512",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Bool => "bool",
        }
    }

    /// Width in bits. `bool` occupies a full byte.
    pub fn bits(&self) -> u32 {
        match self {
            PrimitiveType::I8 | PrimitiveType::U8 | PrimitiveType::Bool => 8,
            PrimitiveType::I16 | PrimitiveType::U16 => 16,
            PrimitiveType::I32 | PrimitiveType::U32 | PrimitiveType::F32 => 32,
            PrimitiveType::I64 | PrimitiveType::U64 | PrimitiveType::F64 => 64,
            PrimitiveType::I128 | PrimitiveType::U128 => 128,
            PrimitiveType::I256 | PrimitiveType::U256 => 256,
            PrimitiveType::I512 | PrimitiveType::U512 => 512,
        }
    }

    /// Returns the size in bytes of this primitive type
    pub fn size_bytes(&self) -> usize {
        (self.bits() / 8) as usize
    }

    pub fn is_integer(&self) -> bool {
        !self.is_float() && !self.is_bool()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveType::F32 | PrimitiveType::F64)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, PrimitiveType::Bool)
    }

    /// Signed integers and floats. `bool` is neither signed nor unsigned.
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            PrimitiveType::I8
                | PrimitiveType::I16
                | PrimitiveType::I32
                | PrimitiveType::I64
                | PrimitiveType::I128
                | PrimitiveType::I256
                | PrimitiveType::I512
                | PrimitiveType::F32
                | PrimitiveType::F64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        self.is_integer() && !self.is_signed()
    }

    /// Exact inclusive bounds of an integer primitive.
    ///
    /// Computed with big integers so 256- and 512-bit widths are exact.
    /// Returns `None` for floats and `bool`.
    pub fn int_bounds(&self) -> Option<(BigInt, BigInt)> {
        if !self.is_integer() {
            return None;
        }
        let bits = self.bits() as usize;
        let one = BigInt::from(1u8);
        if self.is_signed() {
            let half = &one << (bits - 1);
            Some((-half.clone(), half - one))
        } else {
            Some((BigInt::from(0u8), (&one << bits) - one))
        }
    }

    /// Whether an integer value fits this primitive's bounds exactly
    pub fn contains(&self, value: &BigInt) -> bool {
        match self.int_bounds() {
            Some((min, max)) => *value >= min && *value <= max,
            None => false,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for PrimitiveType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value).ok_or_else(|| format!("unknown primitive type '{}'", value))
    }
}

/// How the element count of an indexed type is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexSize {
    /// Fixed element count: `[T; 4]`
    Fixed(u64),
    /// Unbounded compile-time list: `[T; comptime]`
    Comptime,
    /// Filled in from the initializer: `[T; _]`
    Inferred,
    /// Runtime slice with no static count: `[T]`
    Slice,
}

/// Width of a length prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixWidth {
    /// Unsigned LEB128 varint
    Leb128,
    /// Fixed-width little-endian count (one of the unsigned primitives)
    Fixed(PrimitiveType),
}

/// Framing marker on an indexed type, outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Specifier {
    /// A zero run one element wide follows the data: `:0`
    Null,
    /// The element count precedes the data: `:leb` / `:u8` ...
    Prefix(PrefixWidth),
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Specifier::Null => f.write_str(":0"),
            Specifier::Prefix(PrefixWidth::Leb128) => f.write_str(":leb"),
            Specifier::Prefix(PrefixWidth::Fixed(p)) => write!(f, ":{}", p),
        }
    }
}

/// A tuple field in a type expression
#[derive(Debug, Clone, PartialEq)]
pub struct TupleFieldExpr {
    pub name: Option<Spanned<String>>,
    pub ty: Spanned<TypeExpr>,
}

/// A type expression in the language
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A primitive type (u8, i64, f32, bool, ...)
    Primitive(PrimitiveType),

    /// A user-declared type name
    Named(String),

    /// Pointer type: *T
    Pointer(Box<Spanned<TypeExpr>>),

    /// Array, slice and framed sequence types: [T; 4], [T], [u8:0]
    Indexed {
        element: Box<Spanned<TypeExpr>>,
        size: IndexSize,
        specifiers: Vec<Specifier>,
    },

    /// Tuple type: (i32, f64) or (x: i32, y: i32)
    Tuple(Vec<TupleFieldExpr>),

    /// Function type: fn(i32) -> (i32)
    Func {
        params: Vec<Spanned<TypeExpr>>,
        returns: Vec<Spanned<TypeExpr>>,
    },

    Void,
}

impl TypeExpr {
    pub fn primitive(prim: PrimitiveType) -> Self {
        TypeExpr::Primitive(prim)
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    pub fn pointer(pointee: Spanned<TypeExpr>) -> Self {
        TypeExpr::Pointer(Box::new(pointee))
    }

    pub fn indexed(element: Spanned<TypeExpr>, size: IndexSize, specifiers: Vec<Specifier>) -> Self {
        TypeExpr::Indexed {
            element: Box::new(element),
            size,
            specifiers,
        }
    }
}
