//! Assignability
//!
//! Decides whether a value of one type may flow into a context expecting
//! another, and what the conversion costs. The rules are ordered; the first
//! one that applies decides.

use num_bigint::BigInt;

use crate::ast::{IndexSize, PrimitiveType};
use crate::sema::types::{IndexedType, TupleField, Type};

/// Whether a conversion can discard information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lossiness {
    Lossless,
    Lossy,
}

/// Outcome of [`type_assign_result`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignResult {
    Incompatible,
    Compatible {
        lossiness: Lossiness,
        /// The same bit pattern is valid under both types
        reinterpret: bool,
    },
}

impl AssignResult {
    const IDENTICAL: AssignResult = AssignResult::Compatible {
        lossiness: Lossiness::Lossless,
        reinterpret: true,
    };

    fn lossless(reinterpret: bool) -> Self {
        AssignResult::Compatible {
            lossiness: Lossiness::Lossless,
            reinterpret,
        }
    }

    fn lossy(reinterpret: bool) -> Self {
        AssignResult::Compatible {
            lossiness: Lossiness::Lossy,
            reinterpret,
        }
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, AssignResult::Compatible { .. })
    }

    pub fn is_lossless(&self) -> bool {
        matches!(
            self,
            AssignResult::Compatible {
                lossiness: Lossiness::Lossless,
                ..
            }
        )
    }

    pub fn is_reinterpret(&self) -> bool {
        matches!(
            self,
            AssignResult::Compatible {
                reinterpret: true,
                ..
            }
        )
    }

    /// Implicit conversions must be compatible and lossless
    pub fn is_assignable(&self) -> bool {
        self.is_lossless()
    }

    /// Combine the results of converting each part of an aggregate
    fn and(self, other: AssignResult) -> AssignResult {
        match (self, other) {
            (
                AssignResult::Compatible {
                    lossiness: l1,
                    reinterpret: r1,
                },
                AssignResult::Compatible {
                    lossiness: l2,
                    reinterpret: r2,
                },
            ) => AssignResult::Compatible {
                lossiness: if l1 == Lossiness::Lossy || l2 == Lossiness::Lossy {
                    Lossiness::Lossy
                } else {
                    Lossiness::Lossless
                },
                reinterpret: r1 && r2,
            },
            _ => AssignResult::Incompatible,
        }
    }
}

/// True iff a value of `source` can be used where `target` is expected
/// without an explicit cast
pub fn type_assignable(target: &Type, source: &Type) -> bool {
    type_assign_result(target, source).is_assignable()
}

/// Full judgment of converting `source` into `target`.
///
/// Narrowing and sign changes are reported as compatible but lossy so that
/// explicit casts can use the same rules; [`type_assignable`] rejects them.
pub fn type_assign_result(target: &Type, source: &Type) -> AssignResult {
    // Identical after alias unwrapping
    if target.same_as(source) {
        return AssignResult::IDENTICAL;
    }

    let (target, source) = (target.unalias(), source.unalias());

    // Nominal types only admit comptime scalars, judged against the representation
    if let Type::Named(named) = target {
        if source.is_comptime_number() {
            return type_assign_result(&named.underlying, source);
        }
        return AssignResult::Incompatible;
    }
    if let Type::Named(_) = source {
        return AssignResult::Incompatible;
    }

    match (target, source) {
        (Type::Primitive(t), Type::Primitive(s)) => primitive_result(*t, *s),
        (Type::Primitive(t), Type::ComptimeInt(value)) => comptime_int_result(*t, value),
        (Type::Primitive(t), Type::ComptimeFloat(_)) if t.is_float() => {
            AssignResult::lossless(false)
        }
        (Type::Pointer(t), Type::Pointer(s)) => pointer_result(t, s),
        (Type::Indexed(t), Type::Indexed(s)) => indexed_result(t, s),
        (Type::Indexed(t), Type::ComptimeList(elements)) => list_into_indexed(t, elements),
        (Type::Tuple(t), Type::Tuple(s)) => tuple_result(t, s),
        (Type::Tuple(t), Type::ComptimeList(elements)) => list_into_tuple(t, elements),
        _ => AssignResult::Incompatible,
    }
}

fn primitive_result(target: PrimitiveType, source: PrimitiveType) -> AssignResult {
    // bool never mixes with numbers
    if target.is_bool() || source.is_bool() {
        return if target == source {
            AssignResult::IDENTICAL
        } else {
            AssignResult::Incompatible
        };
    }

    // Different value domains, even at equal size
    if target.is_float() != source.is_float() {
        return AssignResult::lossy(false);
    }

    if target.is_float() {
        return if target.bits() >= source.bits() {
            AssignResult::lossless(false)
        } else {
            AssignResult::lossy(false)
        };
    }

    let (tb, sb) = (target.bits(), source.bits());
    if tb == sb {
        // Same bits, different value domain
        return if target.is_signed() == source.is_signed() {
            AssignResult::IDENTICAL
        } else {
            AssignResult::lossy(true)
        };
    }
    if tb < sb {
        return AssignResult::lossy(false);
    }
    // Widening: sign/zero extension. A signed source loses its negative
    // values in a wider unsigned target.
    if source.is_signed() && !target.is_signed() {
        AssignResult::lossy(false)
    } else {
        AssignResult::lossless(false)
    }
}

fn comptime_int_result(target: PrimitiveType, value: &BigInt) -> AssignResult {
    if target.is_integer() {
        return if target.contains(value) {
            AssignResult::lossless(false)
        } else {
            AssignResult::Incompatible
        };
    }
    if target.is_float() {
        // Significand and exponent limits of the IEEE-754 format
        let (mantissa_bits, max_bits) = if target == PrimitiveType::F32 { (24, 128) } else { (53, 1024) };
        let magnitude = value.magnitude();
        if magnitude.bits() > max_bits {
            return AssignResult::Incompatible;
        }
        let significand = match magnitude.trailing_zeros() {
            Some(zeros) => magnitude >> zeros,
            None => return AssignResult::lossless(false),
        };
        return if significand.bits() <= mantissa_bits {
            AssignResult::lossless(false)
        } else {
            AssignResult::lossy(false)
        };
    }
    AssignResult::Incompatible
}

fn pointer_result(target: &Type, source: &Type) -> AssignResult {
    if target.same_as(source) {
        return AssignResult::IDENTICAL;
    }
    match (target.byte_size(), source.byte_size()) {
        (Some(t), Some(s)) if t == s => AssignResult::lossy(true),
        _ => AssignResult::Incompatible,
    }
}

fn sizes_match(target: IndexSize, source: IndexSize) -> bool {
    match (target, source) {
        (IndexSize::Fixed(t), IndexSize::Fixed(s)) => t == s,
        (IndexSize::Fixed(_), _) => false,
        (IndexSize::Inferred | IndexSize::Comptime, IndexSize::Slice) => false,
        (IndexSize::Inferred | IndexSize::Comptime, _) => true,
        (IndexSize::Slice, _) => true,
    }
}

fn indexed_result(target: &IndexedType, source: &IndexedType) -> AssignResult {
    // Element types must match exactly; element widening is not offered
    if !target.element.same_as(&source.element) {
        return AssignResult::Incompatible;
    }
    if !sizes_match(target.size, source.size) {
        return AssignResult::Incompatible;
    }

    if target.specifiers == source.specifiers {
        // Only the static count differs, e.g. [T; 4] into [T; _]
        return if target.size == IndexSize::Slice && source.size != IndexSize::Slice {
            // Array into slice needs a pointer/length pair built
            if source.is_framed() {
                AssignResult::IDENTICAL
            } else {
                AssignResult::lossless(false)
            }
        } else {
            AssignResult::IDENTICAL
        };
    }

    if target.is_slice() {
        // Terminated or prefixed data viewed as a plain slice
        return AssignResult::lossless(false);
    }

    if target.is_framed() && source.is_inline() {
        // The terminator or prefix is added where the array is converted
        return AssignResult::lossless(false);
    }

    // A slice carries no guarantee that a terminator exists after it,
    // and differing framings are not interchangeable
    AssignResult::Incompatible
}

fn list_into_indexed(target: &IndexedType, elements: &[Type]) -> AssignResult {
    let count = elements.len() as u64;
    if let IndexSize::Fixed(n) = target.size
        && n != count
    {
        return AssignResult::Incompatible;
    }
    let mut result = AssignResult::lossless(false);
    for element in elements {
        let element_result = type_assign_result(&target.element, element);
        if !element_result.is_assignable() {
            return AssignResult::Incompatible;
        }
        result = result.and(element_result);
    }
    AssignResult::lossless(false).and(result)
}

fn list_into_tuple(target: &[TupleField], elements: &[Type]) -> AssignResult {
    if target.len() != elements.len() {
        return AssignResult::Incompatible;
    }
    target
        .iter()
        .zip(elements)
        .fold(AssignResult::lossless(false), |acc, (field, element)| {
            let element_result = type_assign_result(&field.ty, element);
            if element_result.is_assignable() {
                acc.and(element_result)
            } else {
                AssignResult::Incompatible
            }
        })
}

fn tuple_result(target: &[TupleField], source: &[TupleField]) -> AssignResult {
    if target.len() != source.len() {
        return AssignResult::Incompatible;
    }
    let mut result = AssignResult::IDENTICAL;
    for (t, s) in target.iter().zip(source) {
        match (&t.name, &s.name) {
            (Some(a), Some(b)) if a != b => return AssignResult::Incompatible,
            // A named field does not drop its name into a positional slot
            (None, Some(_)) => return AssignResult::Incompatible,
            _ => {}
        }
        result = result.and(type_assign_result(&t.ty, &s.ty));
        if !result.is_compatible() {
            return AssignResult::Incompatible;
        }
    }
    result
}
