//! Placement of literal parts
//!
//! A literal whose element type is itself a framed array or a slice cannot
//! be one contiguous run: each child becomes its own part and the parent
//! becomes a table of references to them. All parts of a batch are sorted
//! by priority so compound runs are written before the simpler runs they
//! contain, which lets the substring search find the simple ones.

use std::cmp::Reverse;

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::config::LayoutConfig;
use crate::sema::types::{IndexedType, Type};

use super::encode::{EncodeError, encode_merged, encode_table};
use super::{DataEntry, DataLayout, DataRef, LayoutError, LiteralId, LiteralValue, OverlapError, QualifiedLiteral};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PartId(usize);

#[derive(Debug)]
enum PartBody<'a> {
    /// One contiguous run, framing included
    Merged { value: &'a LiteralValue },
    /// References to children placed on their own
    Table { children: Vec<PartId>, slices: bool },
}

#[derive(Debug)]
struct Part<'a> {
    literal: LiteralId,
    ty: &'a IndexedType,
    body: PartBody<'a>,
    /// Levels of reference tables above this part
    depth: u32,
}

impl Part<'_> {
    /// Sort key, highest first.
    ///
    /// Runs come before reference tables. Among runs, more framing levels
    /// and then fixed sizes come first; among tables, the more deeply nested
    /// ones, so children are placed before the tables that point at them.
    fn priority(&self) -> (bool, usize, bool, u32) {
        match self.body {
            PartBody::Merged { .. } => (true, self.ty.specifiers.len(), self.ty.fixed_len().is_some(), 0),
            PartBody::Table { .. } => (false, 0, false, self.depth),
        }
    }
}

/// Where a part was written
#[derive(Debug, Clone, Copy, Default)]
struct Placement {
    ptr: u32,
    /// Bytes
    len: u32,
    /// Elements at the outermost level
    count: u32,
}

fn to_u32(n: impl TryInto<u32>) -> Result<u32, LayoutError> {
    n.try_into().map_err(|_| LayoutError::AddressOverflow)
}

fn encode_error(literal: LiteralId, ty: &IndexedType, source: EncodeError) -> LayoutError {
    LayoutError::Encode {
        id: literal,
        ty: Type::Indexed(ty.clone()).to_string(),
        source,
    }
}

/// Parts of one layout call
#[derive(Debug, Default)]
struct PartArena<'a> {
    parts: Vec<Part<'a>>,
}

impl<'a> PartArena<'a> {
    /// Split a value into parts, children first. Returns the part of the value itself.
    fn decompose(
        &mut self,
        literal: LiteralId,
        value: &'a LiteralValue,
        ty: &'a IndexedType,
        depth: u32,
    ) -> Result<PartId, LayoutError> {
        let body = match ty.indexed_element() {
            Some(inner) if ty.has_separate_brackets() => {
                let LiteralValue::List(items) = value else {
                    let reason = EncodeError::Shape("expected one value per referenced array".to_string());
                    return Err(encode_error(literal, ty, reason));
                };
                let children = items
                    .iter()
                    .map(|item| self.decompose(literal, item, inner, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                PartBody::Table {
                    children,
                    slices: inner.is_slice(),
                }
            }
            _ => PartBody::Merged { value },
        };

        let id = PartId(self.parts.len());
        self.parts.push(Part {
            literal,
            ty,
            body,
            depth,
        });
        Ok(id)
    }

    /// Bytes of a part and its element count. `resolve` gives the placement
    /// of each child a table refers to.
    fn serialize<F>(&self, id: PartId, resolve: F) -> Result<(Vec<u8>, usize), LayoutError>
    where
        F: Fn(PartId) -> Option<Placement>,
    {
        let part = &self.parts[id.0];
        match &part.body {
            PartBody::Merged { value } => {
                encode_merged(value, part.ty).map_err(|e| encode_error(part.literal, part.ty, e))
            }
            PartBody::Table { children, slices } => {
                let refs = children
                    .iter()
                    .map(|child| {
                        let placed = resolve(*child).ok_or(LayoutError::ChildNotPlaced {
                            part: id.0,
                            child: child.0,
                        })?;
                        Ok(DataRef {
                            ptr: placed.ptr,
                            len: if *slices { placed.count } else { placed.len },
                        })
                    })
                    .collect::<Result<Vec<_>, LayoutError>>()?;
                let bytes = encode_table(&refs, part.ty, *slices)
                    .map_err(|e| encode_error(part.literal, part.ty, e))?;
                Ok((bytes, refs.len()))
            }
        }
    }
}

/// The auto-placed region, deduplicated against itself and against the
/// explicit runs whose bytes are already final
struct Writer {
    base: u32,
    buffer: Vec<u8>,
    cache: HashMap<Vec<u8>, u32>,
    entries: Vec<DataEntry>,
    /// Explicit runs by address
    fixed: Vec<(u32, Vec<u8>)>,
}

impl Writer {
    fn new(base: u32, fixed: Vec<(u32, Vec<u8>)>) -> Self {
        let mut cache = HashMap::default();
        for (offset, bytes) in &fixed {
            if !bytes.is_empty() {
                cache.entry(bytes.clone()).or_insert(*offset);
            }
        }
        Self {
            base,
            buffer: Vec::new(),
            cache,
            entries: Vec::new(),
            fixed,
        }
    }

    /// Address of `bytes` inside data already written, explicit runs first
    fn find(&self, bytes: &[u8]) -> Option<u64> {
        let fixed = if bytes.is_empty() {
            None
        } else {
            self.fixed
                .iter()
                .find_map(|(offset, run)| find_subslice(run, bytes).map(|pos| *offset as u64 + pos as u64))
        };
        fixed.or_else(|| find_subslice(&self.buffer, bytes).map(|pos| self.base as u64 + pos as u64))
    }

    /// Address of `bytes`, reusing any identical run already written
    fn place(&mut self, bytes: Vec<u8>) -> Result<u32, LayoutError> {
        if let Some(&offset) = self.cache.get(&bytes) {
            tracing::trace!(offset, len = bytes.len(), "exact duplicate");
            return Ok(offset);
        }

        let offset = match self.find(&bytes) {
            Some(address) => {
                tracing::trace!(address, len = bytes.len(), "found inside written data");
                to_u32(address)?
            }
            None => {
                let offset = to_u32(self.base as u64 + self.buffer.len() as u64)?;
                self.buffer.extend_from_slice(&bytes);
                self.entries.push(DataEntry {
                    bytes: bytes.clone(),
                    offset,
                    length: to_u32(bytes.len())?,
                    explicit: false,
                });
                offset
            }
        };
        self.cache.insert(bytes, offset);
        Ok(offset)
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Report every explicit entry that starts before an earlier one ends
fn find_overlaps(ranges: &[(u32, u32)]) -> Vec<OverlapError> {
    let end = |(offset, length): (u32, u32)| offset as u64 + length as u64;
    let mut sorted = ranges.to_vec();
    sorted.sort_by_key(|&(offset, _)| offset);

    let mut errors = Vec::new();
    let mut furthest: Option<(u32, u32)> = None;
    for &(offset, length) in &sorted {
        if let Some(other) = furthest
            && length > 0
            && (offset as u64) < end(other)
        {
            tracing::debug!(offset, other_offset = other.0, "explicit data overlaps");
            errors.push(OverlapError {
                offset,
                length,
                other_offset: other.0,
                other_length: other.1,
            });
        }
        if furthest.is_none_or(|other| end((offset, length)) > end(other)) {
            furthest = Some((offset, length));
        }
    }
    errors
}

/// Lay out a batch of literals.
///
/// Overlapping explicit placements are reported in [`DataLayout::errors`]
/// and do not stop the layout. An `Err` means the input or the part
/// ordering is broken.
#[tracing::instrument(level = "debug", skip_all, fields(literals = literals.len()))]
pub fn layout(literals: &[QualifiedLiteral], config: &LayoutConfig) -> Result<DataLayout, LayoutError> {
    let mut seen = HashSet::default();
    for lit in literals {
        if !seen.insert(lit.id) {
            return Err(LayoutError::DuplicateId(lit.id));
        }
    }

    let mut arena = PartArena::default();
    let mut tops = Vec::with_capacity(literals.len());
    for lit in literals {
        tops.push((lit, arena.decompose(lit.id, &lit.value, &lit.ty, 0)?));
    }
    let mut placed: Vec<Option<Placement>> = vec![None; arena.parts.len()];

    // Explicit literals keep their address. A table's size does not depend
    // on where its children go, so it is reserved now and filled in last.
    let mut explicit = Vec::new();
    let mut runs = Vec::new();
    let mut is_explicit = vec![false; arena.parts.len()];
    for (lit, top) in &tops {
        let Some(address) = lit.address else {
            continue;
        };
        let (bytes, count) = arena.serialize(*top, |_| Some(Placement::default()))?;
        let placement = Placement {
            ptr: address,
            len: to_u32(bytes.len())?,
            count: to_u32(count)?,
        };
        placed[top.0] = Some(placement);
        is_explicit[top.0] = true;
        explicit.push((*top, placement));
        if matches!(arena.parts[top.0].body, PartBody::Merged { .. }) {
            runs.push((address, bytes));
        }
    }

    let ranges: Vec<(u32, u32)> = explicit.iter().map(|(_, p)| (p.ptr, p.len)).collect();
    let errors = find_overlaps(&ranges);
    let explicit_end = ranges
        .iter()
        .map(|&(offset, length)| offset as u64 + length as u64)
        .max()
        .unwrap_or(0);
    let base = to_u32(explicit_end.max(config.base as u64))?;

    let mut order: Vec<PartId> = (0..arena.parts.len())
        .filter(|&i| !is_explicit[i])
        .map(PartId)
        .collect();
    order.sort_by_key(|id| Reverse(arena.parts[id.0].priority()));
    tracing::debug!(parts = order.len(), explicit = explicit.len(), base, "placing parts");

    // Runs that collide with another segment may not keep their bytes
    let colliding: HashSet<u32> = errors.iter().flat_map(|e| [e.offset, e.other_offset]).collect();
    runs.retain(|(address, _)| !colliding.contains(address));

    let mut writer = Writer::new(base, runs);
    for id in order {
        let (bytes, count) = arena.serialize(id, |child| placed[child.0])?;
        let len = to_u32(bytes.len())?;
        let ptr = writer.place(bytes)?;
        placed[id.0] = Some(Placement {
            ptr,
            len,
            count: to_u32(count)?,
        });
    }

    let mut entries = writer.entries;
    for (id, placement) in &explicit {
        let (bytes, _) = arena.serialize(*id, |child| placed[child.0])?;
        entries.push(DataEntry {
            bytes,
            offset: placement.ptr,
            length: placement.len,
            explicit: true,
        });
    }
    entries.sort_by_key(|e| e.offset);

    let mut refs = std::collections::BTreeMap::new();
    for (lit, top) in &tops {
        let placement = placed[top.0].ok_or(LayoutError::ChildNotPlaced {
            part: top.0,
            child: top.0,
        })?;
        refs.insert(
            lit.id,
            DataRef {
                ptr: placement.ptr,
                len: placement.len,
            },
        );
    }

    let total_size = to_u32(entries.iter().map(DataEntry::end).max().unwrap_or(0))?;
    tracing::debug!(entries = entries.len(), total_size, overlaps = errors.len(), "laid out data");

    Ok(DataLayout {
        refs,
        entries,
        total_size,
        errors,
    })
}
