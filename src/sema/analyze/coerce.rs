//! Coercion of checked expressions into an expected type.
//!
//! Aggregate literals are coerced element by element so errors point at the
//! offending element, and so each nested literal is recorded with the type
//! it will be laid out as.

use crate::ast::{Expr, IndexSize, Spanned, UnaryOp};
use crate::sema::SemaError;
use crate::sema::assign::type_assign_result;
use crate::sema::types::{ConcretizeError, Type};

use super::SemanticAnalyzer;

impl SemanticAnalyzer {
    /// Check `expr` and coerce it to `target`
    pub(super) fn coerce(&mut self, expr: &Spanned<Expr>, target: &Type) -> Result<(), SemaError> {
        self.check_expr(expr)?;
        self.coerce_checked(expr, target)
    }

    /// Coerce an expression whose type is already in the map
    pub(super) fn coerce_checked(&mut self, expr: &Spanned<Expr>, target: &Type) -> Result<(), SemaError> {
        // Nothing was recorded when checking failed, which was reported already
        let Some(current) = self.types.get_expr(expr).cloned() else {
            return Ok(());
        };
        let structural = !current.is_concrete();

        match (&expr.node, target.unalias()) {
            (Expr::Group(inner), _) if structural => {
                self.coerce_checked(inner, target)?;
            }
            (
                Expr::If {
                    then_branch,
                    else_branch: Some(else_branch),
                    ..
                },
                _,
            ) if structural => {
                for value in [&then_branch.value, &else_branch.value].into_iter().flatten() {
                    self.coerce_checked(value, target)?;
                }
            }
            (Expr::Match { arms, .. }, _) if structural => {
                for arm in arms {
                    self.coerce_checked(&arm.body, target)?;
                }
            }
            (Expr::Array(elements), Type::Indexed(ix)) if structural => {
                if let IndexSize::Fixed(n) = ix.size
                    && n != elements.len() as u64
                {
                    return Err(SemaError::TypeMismatch {
                        expected: target.display_name(),
                        found: format!("an array of {} elements", elements.len()),
                        span: expr.span,
                    });
                }
                for value in elements {
                    self.coerce_checked(value, &ix.element)?;
                }
            }
            (Expr::Array(elements), Type::Tuple(fields)) if structural => {
                if fields.len() != elements.len() {
                    return Err(self.mismatch(target, &current, expr));
                }
                for (value, field) in elements.iter().zip(fields) {
                    self.coerce_checked(value, &field.ty)?;
                }
            }
            (Expr::Tuple(inits), Type::Tuple(fields)) if structural => {
                if fields.len() != inits.len() {
                    return Err(self.mismatch(target, &current, expr));
                }
                for (init, field) in inits.iter().zip(fields) {
                    // Unnamed values match by position; named ones must agree
                    if let Some(name) = &init.name
                        && field.name.as_deref() != Some(name.node.as_str())
                    {
                        return Err(SemaError::FieldNotFound {
                            ty: target.display_name(),
                            field: name.node.clone(),
                            span: name.span,
                        });
                    }
                    self.coerce_checked(&init.value, &field.ty)?;
                }
            }
            _ => {
                if !type_assign_result(target, &current).is_assignable() {
                    return Err(self.mismatch(target, &current, expr));
                }
                self.settle(expr, target);
                return Ok(());
            }
        }

        self.record(expr.span, expr.node.kind(), target.clone());
        Ok(())
    }

    fn mismatch(&self, target: &Type, found: &Type, expr: &Spanned<Expr>) -> SemaError {
        match found {
            Type::ComptimeInt(value) if target.underlying().is_numeric() => SemaError::ConstantOverflow {
                value: value.to_string(),
                ty: target.display_name(),
                span: expr.span,
            },
            _ => SemaError::TypeMismatch {
                expected: target.display_name(),
                found: found.display_name(),
                span: expr.span,
            },
        }
    }

    /// Record `target` as the type of a literal-shaped expression and of the
    /// literal nodes inside it. Concrete runtime values keep their own type.
    pub(super) fn settle(&mut self, expr: &Spanned<Expr>, target: &Type) {
        let replace = self.types.get_expr(expr).is_some_and(|current| {
            !current.is_concrete()
                || expr.node.is_aggregate_literal()
                || self.def_uses.contains_key(&expr.span)
        });
        if !replace {
            return;
        }
        self.record(expr.span, expr.node.kind(), target.clone());

        match &expr.node {
            Expr::Group(inner) => self.settle(inner, target),
            Expr::If {
                then_branch,
                else_branch: Some(else_branch),
                ..
            } => {
                for value in [&then_branch.value, &else_branch.value].into_iter().flatten() {
                    self.settle(value, target);
                }
            }
            Expr::Match { arms, .. } => {
                for arm in arms {
                    self.settle(&arm.body, target);
                }
            }
            Expr::Array(elements) => match target.unalias() {
                Type::Indexed(ix) => {
                    for value in elements {
                        self.settle(value, &ix.element);
                    }
                }
                Type::Tuple(fields) => {
                    for (value, field) in elements.iter().zip(fields) {
                        self.settle(value, &field.ty);
                    }
                }
                _ => {}
            },
            Expr::Tuple(inits) => {
                if let Type::Tuple(fields) = target.unalias() {
                    for (init, field) in inits.iter().zip(fields) {
                        self.settle(&init.value, &field.ty);
                    }
                }
            }
            Expr::Binary { left, op, right } if op.is_arithmetic() || op.is_bitwise() => {
                self.settle(left, target);
                self.settle(right, target);
            }
            Expr::Unary {
                op: UnaryOp::Neg | UnaryOp::BitNot,
                operand,
            } => self.settle(operand, target),
            _ => {}
        }
    }

    /// Give a comptime expression its default representation
    pub(super) fn concretize_expr(&mut self, expr: &Spanned<Expr>, ty: &Type) -> Result<Type, SemaError> {
        let concrete = ty.concretize(&self.config).map_err(|err| match err {
            ConcretizeError::EmptyList => SemaError::CannotInfer {
                reason: "cannot infer the element type of an empty array".to_string(),
                span: expr.span,
            },
            ConcretizeError::Incoherent { first, other } => SemaError::TypeMismatch {
                expected: first,
                found: other,
                span: expr.span,
            },
        })?;
        self.coerce_checked(expr, &concrete)?;
        Ok(concrete)
    }
}
