//! Byte encoding of literal values
//!
//! Numbers are little-endian at the exact width of their primitive type.
//! Framing specifiers are applied inside-out: the innermost specifier frames
//! each innermost run, and every outer specifier frames the concatenation of
//! the runs below it.

use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;

use crate::ast::{PrefixWidth, PrimitiveType, Specifier};
use crate::sema::types::{IndexedType, POINTER_SIZE, Type};

use super::{DataRef, LiteralValue};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("{0}")]
    Shape(String),

    #[error("integer {value} does not fit in {ty}")]
    IntOutOfRange { value: String, ty: PrimitiveType },
}

fn shape(reason: impl Into<String>) -> EncodeError {
    EncodeError::Shape(reason.into())
}

/// Append `n` as an unsigned LEB128 varint
pub fn write_leb128(out: &mut Vec<u8>, mut n: u64) {
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Two's complement little-endian bytes of `value` at the width of `prim`
pub fn encode_int(value: &BigInt, prim: PrimitiveType) -> Result<Vec<u8>, EncodeError> {
    let out_of_range = || EncodeError::IntOutOfRange {
        value: value.to_string(),
        ty: prim,
    };
    if prim.is_bool() {
        return match u8::try_from(value) {
            Ok(b @ (0 | 1)) => Ok(vec![b]),
            _ => Err(out_of_range()),
        };
    }
    if !prim.is_integer() || !prim.contains(value) {
        return Err(out_of_range());
    }

    let width = prim.size_bytes();
    let pad = if value.sign() == Sign::Minus { 0xff } else { 0x00 };
    let mut bytes = value.to_signed_bytes_le();
    // Unsigned values with the top bit set carry an extra sign byte
    bytes.resize(width.max(bytes.len()), pad);
    bytes.truncate(width);
    Ok(bytes)
}

fn encode_float(value: f64, prim: PrimitiveType) -> Vec<u8> {
    match prim {
        PrimitiveType::F32 => (value as f32).to_le_bytes().to_vec(),
        _ => value.to_le_bytes().to_vec(),
    }
}

/// Width of one element, the size of a null terminator
fn unit_width(element: &Type) -> usize {
    element.underlying().byte_size().map_or(1, |n| n.max(1) as usize)
}

/// Frame one run of `count` elements
fn frame(body: Vec<u8>, count: usize, spec: &Specifier, unit: usize) -> Result<Vec<u8>, EncodeError> {
    match spec {
        Specifier::Null => {
            let mut out = body;
            out.resize(out.len() + unit, 0);
            Ok(out)
        }
        Specifier::Prefix(width) => {
            let mut out = match width {
                PrefixWidth::Leb128 => {
                    let mut out = Vec::with_capacity(body.len() + 1);
                    write_leb128(&mut out, count as u64);
                    out
                }
                PrefixWidth::Fixed(prim) => encode_int(&BigInt::from(count), *prim)?,
            };
            out.extend(body);
            Ok(out)
        }
    }
}

/// Unframed elements of one run, with their count
fn encode_elements(value: &LiteralValue, element: &Type) -> Result<(Vec<u8>, usize), EncodeError> {
    if let Type::Indexed(inner) = element.underlying() {
        let LiteralValue::List(children) = value else {
            return Err(shape("expected one value per nested array"));
        };
        let mut out = Vec::new();
        for child in children {
            let (bytes, count) = encode_elements(child, &inner.element)?;
            if inner.fixed_len() != Some(count as u64) || inner.is_framed() {
                return Err(shape(format!(
                    "nested array of {} elements stored inline as {}",
                    count,
                    Type::Indexed(inner.clone())
                )));
            }
            out.extend(bytes);
        }
        return Ok((out, children.len()));
    }

    let Type::Primitive(prim) = element.underlying() else {
        return Err(shape(format!("elements of type {} have no static encoding", element)));
    };
    let prim = *prim;

    let out = match value {
        LiteralValue::Bytes(bytes) if prim.is_integer() && prim.size_bytes() == 1 => bytes.clone(),
        LiteralValue::Bytes(bytes) if prim.is_integer() => {
            let mut out = Vec::with_capacity(bytes.len() * prim.size_bytes());
            for &b in bytes {
                out.extend(encode_int(&BigInt::from(b), prim)?);
            }
            out
        }
        LiteralValue::Ints(values) if prim.is_float() => values
            .iter()
            .map(|n| {
                n.to_f64()
                    .map(|f| encode_float(f, prim))
                    .ok_or_else(|| shape(format!("{} has no float value", n)))
            })
            .collect::<Result<Vec<_>, _>>()?
            .concat(),
        LiteralValue::Ints(values) => {
            let mut out = Vec::with_capacity(values.len() * prim.size_bytes());
            for n in values {
                out.extend(encode_int(n, prim)?);
            }
            out
        }
        LiteralValue::Floats(values) if prim.is_float() => {
            values.iter().flat_map(|&f| encode_float(f, prim)).collect()
        }
        _ => return Err(shape(format!("value does not hold {} elements", prim))),
    };
    Ok((out, value.len()))
}

/// One framing level and everything inside it
fn encode_level(
    value: &LiteralValue,
    element: &Type,
    specs: &[Specifier],
    unit: usize,
) -> Result<(Vec<u8>, usize), EncodeError> {
    let (body, count) = match specs {
        [_, inner @ ..] if !inner.is_empty() => {
            let LiteralValue::List(children) = value else {
                return Err(shape("expected one value per framed run"));
            };
            let mut body = Vec::new();
            for child in children {
                body.extend(encode_level(child, element, inner, unit)?.0);
            }
            (body, children.len())
        }
        _ => encode_elements(value, element)?,
    };
    match specs.first() {
        Some(spec) => Ok((frame(body, count, spec, unit)?, count)),
        None => Ok((body, count)),
    }
}

/// Encode a value whose framing applies to one contiguous run.
///
/// Returns the bytes and the element count of the outermost level.
pub fn encode_merged(value: &LiteralValue, ty: &IndexedType) -> Result<(Vec<u8>, usize), EncodeError> {
    let unit = unit_width(&ty.element);
    let (bytes, count) = encode_level(value, &ty.element, &ty.specifiers, unit)?;
    if let Some(len) = ty.fixed_len()
        && len != count as u64
    {
        return Err(shape(format!("{} elements for a length of {}", count, len)));
    }
    Ok((bytes, count))
}

/// Encode a table of references to separately placed children: one pointer
/// each, or a pointer and element count when the children are slices.
pub fn encode_table(refs: &[DataRef], ty: &IndexedType, slices: bool) -> Result<Vec<u8>, EncodeError> {
    let unit = (if slices { POINTER_SIZE * 2 } else { POINTER_SIZE }) as usize;
    let mut body = Vec::with_capacity(refs.len() * unit);
    for r in refs {
        body.extend(r.ptr.to_le_bytes());
        if slices {
            body.extend(r.len.to_le_bytes());
        }
    }

    if let Some(len) = ty.fixed_len()
        && len != refs.len() as u64
    {
        return Err(shape(format!("{} elements for a length of {}", refs.len(), len)));
    }
    match ty.specifiers.as_slice() {
        [] => Ok(body),
        [spec] => frame(body, refs.len(), spec, unit),
        _ => Err(shape("a reference table takes at most one framing specifier")),
    }
}
