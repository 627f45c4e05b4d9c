//! Semantic Analysis Logic
//!
//! Traverses the AST to populate the symbol table and perform type checking.
//! Errors are collected rather than returned so one pass reports every
//! diagnostic in the module.

mod coerce;
mod collect;
mod expr;
mod item;
mod register;
mod stmt;

use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::ast::{NodeKind, SourceFile, Span, Spanned, TypeDecl, TypeExpr};
use crate::config::CheckConfig;
use crate::sema::const_eval::ConstEnv;
use crate::sema::table::{SymbolKind, SymbolTable};
use crate::sema::types::{FuncType, IndexedType, TupleField, Type};
use crate::sema::{CheckResult, SemaError, TypeKey, TypeMap};

use collect::LiteralCollector;

/// Result slots of the function whose body is being checked
#[derive(Debug, Clone)]
pub(super) struct ReturnContext {
    pub types: Vec<Type>,
    /// Every result is named, so a bare `return` is allowed
    pub named: bool,
}

impl ReturnContext {
    /// The type a returned value must have
    pub fn value_type(&self) -> Type {
        match self.types.as_slice() {
            [] => Type::Void,
            [single] => single.clone(),
            many => Type::tuple(many.to_vec()),
        }
    }
}

pub struct SemanticAnalyzer {
    pub table: SymbolTable,
    pub errors: Vec<SemaError>,
    pub(super) types: TypeMap,
    pub(super) config: CheckConfig,
    /// Values of `def` constants, by name
    pub(super) const_env: ConstEnv,
    /// Identifier nodes that resolved to a `def`, mapped to its name
    pub(super) def_uses: HashMap<Span, String>,
    /// Explicit addresses of data segment values, keyed by the value's span
    pub(super) segment_offsets: HashMap<Span, u32>,
    /// Declared but not yet resolved type declarations, with the declaration span
    pub(super) pending_types: HashMap<String, (TypeDecl, Span)>,
    /// Type declarations being resolved, for cycle detection
    pub(super) resolving_types: HashSet<String>,
    /// External export names already taken
    pub(super) exported: HashMap<String, Span>,
    /// The module's `memory` declaration, once seen
    pub(super) memory: Option<Span>,
    /// Result types of the function being checked
    pub(super) current_returns: Option<ReturnContext>,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new(CheckConfig::default())
    }
}

impl SemanticAnalyzer {
    pub fn new(config: CheckConfig) -> Self {
        Self {
            table: SymbolTable::new(),
            errors: Vec::new(),
            types: TypeMap::default(),
            config,
            const_env: ConstEnv::default(),
            def_uses: HashMap::default(),
            segment_offsets: HashMap::default(),
            pending_types: HashMap::default(),
            resolving_types: HashSet::default(),
            exported: HashMap::default(),
            memory: None,
            current_returns: None,
        }
    }

    pub fn analyze(&mut self, source: &SourceFile) -> CheckResult {
        // First pass: types, then signatures, then constants and globals in order
        self.register_types(source);
        for item in &source.items {
            self.report(|this| this.register_signature(item));
        }
        for item in &source.items {
            self.report(|this| this.register_value(item));
        }

        // Second pass: function bodies, memory and exports
        for item in &source.items {
            self.report(|this| this.analyze_item(item));
        }

        self.finalize_types();

        let mut collector = LiteralCollector::new(
            &self.types,
            &self.const_env,
            &self.def_uses,
            &self.segment_offsets,
        );
        crate::ast::visit::Visit::visit_source(&mut collector, source);
        let (literals, literal_errors) = collector.finish();
        self.errors.extend(literal_errors);

        CheckResult {
            types: std::mem::take(&mut self.types),
            table: self.table.clone(),
            errors: std::mem::take(&mut self.errors),
            literals,
        }
    }

    /// Run a fallible step, keeping its error and carrying on
    pub(super) fn report<F>(&mut self, step: F)
    where
        F: FnOnce(&mut Self) -> Result<(), SemaError>,
    {
        if let Err(err) = step(self) {
            tracing::debug!(%err, "type error");
            self.errors.push(err);
        }
    }

    pub(super) fn record(&mut self, span: Span, kind: NodeKind, ty: Type) {
        self.types.insert(TypeKey::new(span, kind), ty);
    }

    /// Replace every comptime entry left in the type map by its default
    /// representation. Entries with no runtime meaning, such as an untyped
    /// empty list under a `def`, are dropped.
    fn finalize_types(&mut self) {
        let mut dropped = Vec::new();
        let mut settled = 0usize;
        for (key, ty) in self.types.iter_mut() {
            if ty.is_concrete() {
                continue;
            }
            match ty.concretize(&self.config) {
                Ok(concrete) if concrete.is_concrete() => {
                    *ty = concrete;
                    settled += 1;
                }
                _ => dropped.push(*key),
            }
        }
        for key in &dropped {
            self.types.remove(key);
        }
        tracing::debug!(settled, dropped = dropped.len(), "finalized type map");
    }

    /// Resolve a type expression to a type
    pub(super) fn resolve_type(&mut self, ty: &Spanned<TypeExpr>) -> Result<Type, SemaError> {
        match &ty.node {
            TypeExpr::Primitive(prim) => Ok(Type::Primitive(*prim)),
            TypeExpr::Named(name) => self.resolve_named_type(name, ty.span),
            TypeExpr::Pointer(pointee) => Ok(Type::Pointer(Box::new(self.resolve_type(pointee)?))),
            TypeExpr::Indexed {
                element,
                size,
                specifiers,
            } => {
                for spec in specifiers {
                    if let crate::ast::Specifier::Prefix(crate::ast::PrefixWidth::Fixed(p)) = spec
                        && !p.is_unsigned()
                    {
                        return Err(SemaError::Custom {
                            message: format!("length prefix must be an unsigned integer, found {}", p),
                            span: ty.span,
                        });
                    }
                }
                let element = self.resolve_type(element)?;
                if matches!(element, Type::Void) {
                    return Err(SemaError::Custom {
                        message: "array element type cannot be void".to_string(),
                        span: ty.span,
                    });
                }
                Ok(Type::Indexed(IndexedType::new(element, *size, specifiers.clone())))
            }
            TypeExpr::Tuple(fields) => {
                let mut seen = HashSet::default();
                let mut resolved = Vec::with_capacity(fields.len());
                for field in fields {
                    if let Some(name) = &field.name
                        && !seen.insert(name.node.clone())
                    {
                        return Err(SemaError::DuplicateSymbol {
                            name: name.node.clone(),
                            span: name.span,
                            previous_span: None,
                        });
                    }
                    resolved.push(TupleField {
                        name: field.name.as_ref().map(|n| n.node.clone()),
                        ty: self.resolve_type(&field.ty)?,
                    });
                }
                Ok(Type::Tuple(resolved))
            }
            TypeExpr::Func { params, returns } => Ok(Type::Func(FuncType {
                params: params.iter().map(|p| self.resolve_type(p)).collect::<Result<_, _>>()?,
                returns: returns.iter().map(|r| self.resolve_type(r)).collect::<Result<_, _>>()?,
            })),
            TypeExpr::Void => Ok(Type::Void),
        }
    }

    fn resolve_named_type(&mut self, name: &str, span: Span) -> Result<Type, SemaError> {
        if let Some(info) = self.table.lookup(name) {
            return if info.kind == SymbolKind::Type {
                Ok(info.ty.clone())
            } else {
                Err(SemaError::Custom {
                    message: format!("'{}' is not a type", name),
                    span,
                })
            };
        }
        if self.resolving_types.contains(name) {
            return Err(SemaError::Custom {
                message: format!("type '{}' refers to itself", name),
                span,
            });
        }
        match self.pending_types.remove(name) {
            Some((decl, decl_span)) => self.define_type(&decl, decl_span),
            None => Err(SemaError::UndefinedSymbol {
                name: name.to_string(),
                span,
            }),
        }
    }
}

/// Fill `[T; _]` and `[T; comptime]` sizes from the value bound to them
pub(super) fn fill_inferred_size(target: &Type, source: &Type) -> Type {
    let Type::Indexed(ix) = target else {
        return target.clone();
    };
    if !matches!(ix.size, crate::ast::IndexSize::Inferred | crate::ast::IndexSize::Comptime) {
        return target.clone();
    }
    let len = match source.unalias() {
        Type::Indexed(src) => src.fixed_len(),
        Type::ComptimeList(elements) => Some(elements.len() as u64),
        _ => None,
    };
    match len {
        Some(n) => Type::Indexed(IndexedType {
            element: ix.element.clone(),
            size: crate::ast::IndexSize::Fixed(n),
            specifiers: ix.specifiers.clone(),
        }),
        None => target.clone(),
    }
}
