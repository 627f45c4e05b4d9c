//! Declaration Analysis
//!
//! Second pass over module items: function bodies, memory declarations and
//! their data segments, and exports.

use crate::ast::{DataSegment, Decl, Export, Memory, NodeKind, PrimitiveType, Span, Spanned};
use crate::sema::SemaError;
use crate::sema::table::SymbolKind;
use crate::sema::types::Type;

use super::SemanticAnalyzer;

/// Bytes in one page of linear memory
pub(super) const PAGE_SIZE: u64 = 65536;

impl SemanticAnalyzer {
    pub(super) fn analyze_item(&mut self, item: &Spanned<Decl>) -> Result<(), SemaError> {
        match &item.node {
            Decl::Function(func) => self.analyze_function(func),
            Decl::Memory(memory) => self.analyze_memory(memory, item.span),
            Decl::Export(export) => self.analyze_export(export, item.span),
            Decl::Import(_) | Decl::Type(_) | Decl::Def(_) | Decl::Global(_) => Ok(()),
        }
    }

    fn analyze_memory(&mut self, memory: &Memory, span: Span) -> Result<(), SemaError> {
        if let Some(previous) = self.memory {
            return Err(SemaError::DuplicateSymbol {
                name: "memory".to_string(),
                span,
                previous_span: Some(previous),
            });
        }
        self.memory = Some(span);

        if let Some(max) = memory.max_pages
            && max < memory.min_pages
        {
            self.errors.push(SemaError::Custom {
                message: format!(
                    "maximum memory size ({} pages) is below the minimum ({} pages)",
                    max, memory.min_pages
                ),
                span,
            });
        }

        let limit = memory.min_pages as u64 * PAGE_SIZE;
        for segment in &memory.segments {
            self.report(|this| this.analyze_segment(segment, limit));
        }
        Ok(())
    }

    fn analyze_segment(&mut self, segment: &DataSegment, limit: u64) -> Result<(), SemaError> {
        let offset_ty = self.check_expr(&segment.offset)?;
        let Type::ComptimeInt(offset) = &offset_ty else {
            return Err(SemaError::TypeMismatch {
                expected: "a constant address".to_string(),
                found: offset_ty.display_name(),
                span: segment.offset.span,
            });
        };
        let address = u32::try_from(offset).map_err(|_| SemaError::ConstantOverflow {
            value: offset.to_string(),
            ty: PrimitiveType::U32.to_string(),
            span: segment.offset.span,
        })?;
        self.settle(&segment.offset, &Type::Primitive(PrimitiveType::U32));

        let value = &segment.value;
        if !value.node.is_aggregate_literal() || matches!(value.node, crate::ast::Expr::Tuple(_)) {
            return Err(SemaError::Custom {
                message: "data segment value must be a string or array literal".to_string(),
                span: value.span,
            });
        }

        let annotated = match &segment.ty {
            Some(annotation) => Some(self.resolve_type(annotation)?),
            None => None,
        };
        let ty = self.check_binding(value, annotated.as_ref())?;
        if ty.as_indexed().is_none() {
            return Err(SemaError::TypeMismatch {
                expected: "an array or string type".to_string(),
                found: ty.display_name(),
                span: value.span,
            });
        }
        if address as u64 >= limit {
            return Err(SemaError::Custom {
                message: format!("data segment at offset {} is outside the initial memory", address),
                span: segment.offset.span,
            });
        }

        self.segment_offsets.insert(value.span, address);
        self.record(segment.offset.span.merge(value.span), NodeKind::DataSegment, ty);
        Ok(())
    }

    fn analyze_export(&mut self, export: &Export, span: Span) -> Result<(), SemaError> {
        if let Some(previous) = self.exported.get(&export.external) {
            return Err(SemaError::DuplicateSymbol {
                name: export.external.clone(),
                span,
                previous_span: Some(*previous),
            });
        }

        let symbol = &export.symbol;
        let info = self
            .table
            .lookup(&symbol.node)
            .ok_or_else(|| SemaError::UndefinedSymbol {
                name: symbol.node.clone(),
                span: symbol.span,
            })?;
        if !matches!(info.kind, SymbolKind::Func | SymbolKind::Global) {
            return Err(SemaError::Custom {
                message: format!("cannot export '{}': not a function or global", symbol.node),
                span: symbol.span,
            });
        }

        let ty = info.ty.clone();
        self.exported.insert(export.external.clone(), span);
        self.record(span, NodeKind::Export, ty);
        Ok(())
    }
}
