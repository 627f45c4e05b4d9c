//! Registration Pass
//!
//! First pass of semantic analysis that registers all module-level items
//! (types, functions, imports, constants, globals) before analyzing bodies.

use crate::ast::{Decl, Def, FnParam, FnReturn, Global, Import, ImportItem, SourceFile, Span, Spanned, TypeDecl};
use crate::sema::const_eval::eval_const_expr_with_env;
use crate::sema::table::{SymbolInfo, SymbolKind};
use crate::sema::types::{FuncType, Type};
use crate::sema::SemaError;

use super::{SemanticAnalyzer, fill_inferred_size};

impl SemanticAnalyzer {
    /// Insert into the current scope, rejecting a second definition
    pub(super) fn declare(&mut self, info: SymbolInfo) -> Result<(), SemaError> {
        if let Some(previous) = self.table.scope(self.table.current()).get(&info.name) {
            return Err(SemaError::DuplicateSymbol {
                name: info.name.clone(),
                span: info.span,
                previous_span: Some(previous.span),
            });
        }
        self.table.insert(info);
        Ok(())
    }

    /// Register type declarations. Forward references between types are
    /// resolved on demand.
    pub(super) fn register_types(&mut self, source: &SourceFile) {
        let mut order = Vec::new();
        for item in &source.items {
            let Decl::Type(decl) = &item.node else {
                continue;
            };
            let name = decl.name.node.clone();
            if let Some((previous, _)) = self.pending_types.get(&name) {
                self.errors.push(SemaError::DuplicateSymbol {
                    name,
                    span: decl.name.span,
                    previous_span: Some(previous.name.span),
                });
                continue;
            }
            self.pending_types.insert(name.clone(), (decl.clone(), item.span));
            order.push(name);
        }

        for name in order {
            // Already resolved through a reference from an earlier type
            if let Some((decl, span)) = self.pending_types.remove(&name)
                && let Err(err) = self.define_type(&decl, span)
            {
                self.errors.push(err);
            }
        }
    }

    pub(super) fn define_type(&mut self, decl: &TypeDecl, span: Span) -> Result<Type, SemaError> {
        let name = decl.name.node.clone();
        self.resolving_types.insert(name.clone());
        let underlying = self.resolve_type(&decl.ty);
        self.resolving_types.remove(&name);

        let ty = Type::named(name.clone(), underlying?, decl.unique);
        self.declare(SymbolInfo {
            name,
            kind: SymbolKind::Type,
            ty: ty.clone(),
            mutable: false,
            span: decl.name.span,
        })?;
        self.record(span, crate::ast::NodeKind::TypeDecl, ty.clone());
        Ok(ty)
    }

    pub(super) fn signature(
        &mut self,
        params: &[FnParam],
        returns: &[FnReturn],
    ) -> Result<FuncType, SemaError> {
        Ok(FuncType {
            params: params
                .iter()
                .map(|p| self.resolve_type(&p.ty))
                .collect::<Result<_, _>>()?,
            returns: returns
                .iter()
                .map(|r| self.resolve_type(&r.ty))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Functions and imports, so bodies and initializers can refer to any of them
    pub(super) fn register_signature(&mut self, item: &Spanned<Decl>) -> Result<(), SemaError> {
        match &item.node {
            Decl::Function(func) => {
                let ty = Type::Func(self.signature(&func.params, &func.returns)?);
                self.declare(SymbolInfo {
                    name: func.name.node.clone(),
                    kind: SymbolKind::Func,
                    ty: ty.clone(),
                    mutable: false,
                    span: func.name.span,
                })?;
                self.record(item.span, crate::ast::NodeKind::Function, ty);
            }
            Decl::Import(import) => self.register_import(import, item.span)?,
            _ => {}
        }
        Ok(())
    }

    fn register_import(&mut self, import: &Import, span: Span) -> Result<(), SemaError> {
        let (kind, ty, mutable) = match &import.item {
            ImportItem::Func { params, returns, .. } => {
                (SymbolKind::Func, Type::Func(self.signature(params, returns)?), false)
            }
            ImportItem::Global { ty, mutable, .. } => (SymbolKind::Global, self.resolve_type(ty)?, *mutable),
        };
        let name = import.item.name();
        tracing::trace!(module = %import.module, field = %import.field, name = %name.node, "import");
        self.declare(SymbolInfo {
            name: name.node.clone(),
            kind,
            ty: ty.clone(),
            mutable,
            span: name.span,
        })?;
        self.record(span, crate::ast::NodeKind::Import, ty);
        Ok(())
    }

    /// Constants and globals, in source order
    pub(super) fn register_value(&mut self, item: &Spanned<Decl>) -> Result<(), SemaError> {
        match &item.node {
            Decl::Def(def) => self.register_def(def, item.span),
            Decl::Global(global) => self.register_global(global, item.span),
            _ => Ok(()),
        }
    }

    fn register_def(&mut self, def: &Def, span: Span) -> Result<(), SemaError> {
        let value_ty = self.check_expr(&def.value)?;
        // Without an annotation the constant keeps its comptime type
        let ty = match &def.ty {
            Some(annotation) => {
                let target = self.resolve_type(annotation)?;
                let target = fill_inferred_size(&target, &value_ty);
                self.coerce_checked(&def.value, &target)?;
                target
            }
            None => value_ty,
        };

        let value = eval_const_expr_with_env(&def.value, &self.const_env).map_err(|_| {
            SemaError::Custom {
                message: format!("value of '{}' must be a constant expression", def.name.node),
                span: def.value.span,
            }
        })?;
        self.const_env.insert(def.name.node.clone(), value);

        self.declare(SymbolInfo {
            name: def.name.node.clone(),
            kind: SymbolKind::Def,
            ty: ty.clone(),
            mutable: false,
            span: def.name.span,
        })?;
        self.record(span, crate::ast::NodeKind::Def, ty);
        Ok(())
    }

    fn register_global(&mut self, global: &Global, span: Span) -> Result<(), SemaError> {
        let annotated = match &global.ty {
            Some(annotation) => Some(self.resolve_type(annotation)?),
            None => None,
        };

        let checked = self.check_binding(&global.value, annotated.as_ref());
        // Keep the name resolvable even when the initializer is wrong
        let ty = match (&checked, annotated) {
            (Ok(ty), _) => ty.clone(),
            (Err(_), Some(annotated)) => annotated,
            (Err(err), None) => return Err(err.clone()),
        };

        self.declare(SymbolInfo {
            name: global.name.node.clone(),
            kind: SymbolKind::Global,
            ty: ty.clone(),
            mutable: global.mutable,
            span: global.name.span,
        })?;
        self.record(span, crate::ast::NodeKind::Global, ty);
        checked?;

        if eval_const_expr_with_env(&global.value, &self.const_env).is_err() {
            return Err(SemaError::Custom {
                message: format!("initializer of '{}' must be a constant expression", global.name.node),
                span: global.value.span,
            });
        }
        Ok(())
    }
}
