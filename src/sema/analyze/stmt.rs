//! Statement Analysis
//!
//! Type checking for function bodies, blocks and all statement variants.

use crate::ast::{Block, Expr, Function, NodeKind, Pattern, PrimitiveType, Spanned, Stmt};
use crate::sema::SemaError;
use crate::sema::table::{SymbolInfo, SymbolKind};
use crate::sema::types::Type;

use super::{ReturnContext, SemanticAnalyzer, fill_inferred_size};

impl SemanticAnalyzer {
    pub(super) fn analyze_function(&mut self, func: &Function) -> Result<(), SemaError> {
        let name = &func.name.node;
        // Registration already reported why the signature is unusable
        let Some(Type::Func(signature)) = self
            .table
            .lookup(name)
            .filter(|info| info.kind == SymbolKind::Func)
            .map(|info| info.ty.clone())
        else {
            return Ok(());
        };

        self.table.enter_scope(Some(name.clone()));
        for (param, ty) in func.params.iter().zip(&signature.params) {
            self.report(|this| {
                this.declare(SymbolInfo {
                    name: param.name.node.clone(),
                    kind: SymbolKind::Param,
                    ty: ty.clone(),
                    mutable: true,
                    span: param.name.span,
                })
            });
            self.record(param.name.span, NodeKind::Param, ty.clone());
        }
        for (ret, ty) in func.returns.iter().zip(&signature.returns) {
            if let Some(ret_name) = &ret.name {
                self.report(|this| {
                    this.declare(SymbolInfo {
                        name: ret_name.node.clone(),
                        kind: SymbolKind::Return,
                        ty: ty.clone(),
                        mutable: true,
                        span: ret_name.span,
                    })
                });
                self.record(ret_name.span, NodeKind::Return, ty.clone());
            }
        }

        let context = ReturnContext {
            types: signature.returns.clone(),
            named: !func.returns.is_empty() && func.returns.iter().all(|r| r.name.is_some()),
        };
        let expected = context.value_type();
        self.current_returns = Some(context);
        tracing::trace!(function = %name, "checking body");

        // A body without a trailing value returns through statements
        if func.body.value.is_some() {
            self.check_block(&func.body, Some(&expected));
        } else {
            self.check_block(&func.body, None);
        }

        self.current_returns = None;
        self.table.exit_scope();
        Ok(())
    }

    /// Check a block in its own scope, returning the type of its value.
    /// With `expected`, the trailing value is coerced to it.
    pub(super) fn check_block(&mut self, block: &Block, expected: Option<&Type>) -> Type {
        self.table.enter_scope(None);
        for stmt in &block.stmts {
            self.report(|this| this.check_stmt(stmt));
        }

        let ty = match (&block.value, expected) {
            (None, _) => Type::Void,
            (Some(value), Some(expected)) => {
                self.report(|this| this.coerce(value, expected));
                expected.clone()
            }
            (Some(value), None) => match self.check_expr(value) {
                Ok(ty) => ty,
                Err(err) => {
                    self.errors.push(err);
                    Type::Void
                }
            },
        };

        self.table.exit_scope();
        ty
    }

    pub(super) fn check_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), SemaError> {
        match &stmt.node {
            Stmt::Let { pattern, ty, value } => {
                let annotated = match ty {
                    Some(annotation) => Some(self.resolve_type(annotation)?),
                    None => None,
                };
                match self.check_binding(value, annotated.as_ref()) {
                    Ok(bound) => self.bind_pattern(pattern, &bound),
                    Err(err) => {
                        // Bind anyway so later uses do not cascade
                        if let Some(annotated) = annotated {
                            self.report(|this| this.bind_pattern(pattern, &annotated));
                        }
                        Err(err)
                    }
                }
            }
            Stmt::Assign { target, value } => {
                let target_ty = self.check_place(target)?;
                self.coerce(value, &target_ty)
            }
            Stmt::Expr(expr) => {
                let ty = self.check_expr(expr)?;
                if !ty.is_concrete() {
                    self.concretize_expr(expr, &ty)?;
                }
                Ok(())
            }
            Stmt::Return(value) => {
                let Some(context) = self.current_returns.clone() else {
                    return Err(SemaError::Custom {
                        message: "return outside of a function".to_string(),
                        span: stmt.span,
                    });
                };
                match value {
                    Some(value) => self.coerce(value, &context.value_type()),
                    None if context.types.is_empty() || context.named => Ok(()),
                    None => Err(SemaError::TypeMismatch {
                        expected: context.value_type().display_name(),
                        found: Type::Void.display_name(),
                        span: stmt.span,
                    }),
                }
            }
        }
    }

    /// Type of an initializer bound to a name.
    ///
    /// An annotation always wins and is validated against the value; without
    /// one, comptime values take the configured default types.
    pub(super) fn check_binding(
        &mut self,
        value: &Spanned<Expr>,
        annotated: Option<&Type>,
    ) -> Result<Type, SemaError> {
        let value_ty = self.check_expr(value)?;
        match annotated {
            Some(target) => {
                let target = fill_inferred_size(target, &value_ty);
                self.coerce_checked(value, &target)?;
                Ok(target)
            }
            None if matches!(value_ty, Type::Void) => Err(SemaError::TypeMismatch {
                expected: "a value".to_string(),
                found: value_ty.display_name(),
                span: value.span,
            }),
            None => self.concretize_expr(value, &value_ty),
        }
    }

    pub(super) fn bind_pattern(&mut self, pattern: &Spanned<Pattern>, ty: &Type) -> Result<(), SemaError> {
        match &pattern.node {
            Pattern::Identifier(name) => {
                if name != "_" {
                    // `let` may shadow an earlier binding in the same block
                    self.table.insert(SymbolInfo {
                        name: name.clone(),
                        kind: SymbolKind::Local,
                        ty: ty.clone(),
                        mutable: true,
                        span: pattern.span,
                    });
                }
                self.record(pattern.span, NodeKind::IdentifierPattern, ty.clone());
                Ok(())
            }
            Pattern::Tuple(items) => {
                let Type::Tuple(fields) = ty.unalias() else {
                    return Err(SemaError::TypeMismatch {
                        expected: format!("a tuple of {} fields", items.len()),
                        found: ty.display_name(),
                        span: pattern.span,
                    });
                };
                if fields.len() != items.len() {
                    return Err(SemaError::TypeMismatch {
                        expected: format!("a tuple of {} fields", items.len()),
                        found: ty.display_name(),
                        span: pattern.span,
                    });
                }
                for (item, field) in items.iter().zip(fields) {
                    self.bind_pattern(item, &field.ty)?;
                }
                self.record(pattern.span, NodeKind::TuplePattern, ty.clone());
                Ok(())
            }
        }
    }

    /// Type of an assignment target, rejecting immutable bindings
    fn check_place(&mut self, target: &Spanned<Expr>) -> Result<Type, SemaError> {
        match &target.node {
            Expr::Identifier(name) => {
                if let Some(info) = self.table.lookup(name) {
                    let writable = match info.kind {
                        SymbolKind::Local | SymbolKind::Param | SymbolKind::Return => true,
                        SymbolKind::Global => info.mutable,
                        SymbolKind::Def | SymbolKind::Func | SymbolKind::Type => false,
                    };
                    if !writable {
                        return Err(SemaError::ImmutableAssignment {
                            symbol: name.clone(),
                            span: target.span,
                        });
                    }
                }
                self.check_expr(target)
            }
            Expr::Index { .. } | Expr::Member { .. } => self.check_expr(target),
            Expr::Unary { op: crate::ast::UnaryOp::Deref, .. } => self.check_expr(target),
            Expr::Group(inner) => self.check_place(inner),
            _ => Err(SemaError::Custom {
                message: "invalid assignment target".to_string(),
                span: target.span,
            }),
        }
    }

    pub(super) fn bool_type() -> Type {
        Type::Primitive(PrimitiveType::Bool)
    }
}
