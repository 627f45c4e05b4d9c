//! Static data layout
//!
//! Places the literals collected by the checker into one linear-memory
//! region:
//! - Explicitly addressed literals (from `memory` data segments) are placed
//!   first and checked for overlaps
//! - The remaining literals are split into parts, ordered so compound values
//!   are written before their components, and deduplicated against
//!   everything written so far
//! - Every literal gets back a pointer and length

mod encode;
mod layout;

use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigInt;

use crate::sema::types::IndexedType;

pub use encode::{EncodeError, encode_int, encode_merged, encode_table, write_leb128};
pub use layout::layout;

/// Identity of a literal within one layout batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LiteralId(pub u32);

impl fmt::Display for LiteralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Contents of a literal, shaped like its indexed type
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Bytes(Vec<u8>),
    Ints(Vec<BigInt>),
    Floats(Vec<f64>),
    /// One entry per element of an array of arrays, or per level of framing
    List(Vec<LiteralValue>),
}

impl LiteralValue {
    pub fn len(&self) -> usize {
        match self {
            LiteralValue::Bytes(b) => b.len(),
            LiteralValue::Ints(v) => v.len(),
            LiteralValue::Floats(v) => v.len(),
            LiteralValue::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A literal value with its resolved type, ready for placement
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedLiteral {
    pub id: LiteralId,
    pub value: LiteralValue,
    pub ty: IndexedType,
    /// Absolute address requested by the program
    pub address: Option<u32>,
}

/// One placed run of bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub bytes: Vec<u8>,
    pub offset: u32,
    pub length: u32,
    pub explicit: bool,
}

impl DataEntry {
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.length as u64
    }
}

/// Where a literal ended up: its address and its size in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataRef {
    pub ptr: u32,
    pub len: u32,
}

/// Two explicitly placed literals claim the same bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapError {
    pub offset: u32,
    pub length: u32,
    pub other_offset: u32,
    pub other_length: u32,
}

impl fmt::Display for OverlapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data at offset {} (length {}) overlaps entry at offset {} (length {})",
            self.offset, self.length, self.other_offset, self.other_length
        )
    }
}

/// Result of laying out one batch of literals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataLayout {
    pub refs: BTreeMap<LiteralId, DataRef>,
    /// Every placed run, by offset
    pub entries: Vec<DataEntry>,
    pub total_size: u32,
    pub errors: Vec<OverlapError>,
}

impl DataLayout {
    pub fn get(&self, id: LiteralId) -> Option<DataRef> {
        self.refs.get(&id).copied()
    }

    /// Byte at an absolute address, zero where nothing was placed
    pub fn byte_at(&self, address: u32) -> u8 {
        self.entries
            .iter()
            .rev()
            .find(|e| e.offset <= address && (address as u64) < e.end())
            .map_or(0, |e| e.bytes[(address - e.offset) as usize])
    }

    /// The whole region as one buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0; self.total_size as usize];
        for entry in &self.entries {
            let start = entry.offset as usize;
            out[start..start + entry.bytes.len()].copy_from_slice(&entry.bytes);
        }
        out
    }
}

/// Input the layout engine cannot make sense of, or a broken internal ordering
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("cannot encode literal {id} as {ty}: {source}")]
    Encode {
        id: LiteralId,
        ty: String,
        source: EncodeError,
    },

    #[error("part {part} was laid out before part {child} it refers to")]
    ChildNotPlaced { part: usize, child: usize },

    #[error("literal {0} appears more than once")]
    DuplicateId(LiteralId),

    #[error("data does not fit in a 32-bit address space")]
    AddressOverflow,
}
