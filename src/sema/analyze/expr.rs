//! Expression Analysis
//!
//! Type checking for all expression variants. Every checked node has its
//! type written to the type map; comptime results are settled later by
//! coercion or by the final sweep.

use num_bigint::{BigInt, Sign};

use crate::ast::{
    BinaryOp, Block, Expr, Literal, MatchArm, MatchPattern, PrimitiveType, Span, Spanned,
    TupleFieldInit, TypeExpr, UnaryOp,
};
use crate::sema::SemaError;
use crate::sema::assign::{type_assign_result, type_assignable};
use crate::sema::const_eval::{self, ConstValue};
use crate::sema::table::SymbolKind;
use crate::sema::types::{TupleField, Type};

use super::{SemanticAnalyzer, fill_inferred_size};

/// Type of a literal before any context is applied
fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(n) => Type::ComptimeInt(n.clone()),
        Literal::Float(f) => Type::ComptimeFloat(*f),
        Literal::Bool(_) => Type::Primitive(PrimitiveType::Bool),
        // Unannotated strings are fixed byte arrays without framing
        Literal::String(bytes) => Type::indexed(
            Type::Primitive(PrimitiveType::U8),
            crate::ast::IndexSize::Fixed(bytes.len() as u64),
            Vec::new(),
        ),
    }
}

/// Arithmetic representation of a type, seen through every named wrapper
pub(super) fn numeric_prim(ty: &Type) -> Option<PrimitiveType> {
    match ty.underlying() {
        Type::Primitive(p) if !p.is_bool() => Some(*p),
        _ => None,
    }
}

fn comptime_value(ty: &Type) -> Option<ConstValue> {
    match ty {
        Type::ComptimeInt(n) => Some(ConstValue::Int(n.clone())),
        Type::ComptimeFloat(f) => Some(ConstValue::Float(*f)),
        _ => None,
    }
}

/// Expressions whose value `expr` may take, seen through groups and the
/// branches of `if`/`match`
fn branch_values<'e>(expr: &'e Spanned<Expr>, out: &mut Vec<&'e Spanned<Expr>>) {
    match &expr.node {
        Expr::Group(inner) => branch_values(inner, out),
        Expr::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => {
            for value in [&then_branch.value, &else_branch.value].into_iter().flatten() {
                branch_values(value, out);
            }
        }
        Expr::Match { arms, .. } => {
            for arm in arms {
                branch_values(&arm.body, out);
            }
        }
        _ => out.push(expr),
    }
}

/// Explicit conversions: anything compatible, numeric to numeric, pointer
/// to pointer or 32-bit integer, and unique types to and from their
/// representation.
pub(super) fn valid_cast(target: &Type, source: &Type) -> bool {
    if type_assign_result(target, source).is_compatible() {
        return true;
    }
    match (target.underlying(), source.underlying()) {
        (Type::Primitive(a), Type::Primitive(b)) => (!a.is_bool() && !b.is_bool()) || a == b,
        (Type::Pointer(_), Type::Pointer(_)) => true,
        (Type::Pointer(_), Type::Primitive(p)) | (Type::Primitive(p), Type::Pointer(_)) => {
            p.is_integer() && p.bits() == 32
        }
        (t, s) => t.same_as(s),
    }
}

fn is_place(expr: &Expr) -> bool {
    match expr {
        Expr::Identifier(_) | Expr::Index { .. } | Expr::Member { .. } => true,
        Expr::Unary { op: UnaryOp::Deref, .. } => true,
        Expr::Group(inner) => is_place(&inner.node),
        _ => false,
    }
}

/// Turn a failed argument coercion into an error naming the argument
fn argument_error(index: usize, err: SemaError) -> SemaError {
    match err {
        SemaError::TypeMismatch { expected, found, span } => SemaError::ArgumentMismatch {
            index,
            expected,
            found,
            span,
        },
        SemaError::ConstantOverflow { value, ty, span } => SemaError::ArgumentMismatch {
            index,
            expected: ty,
            found: value,
            span,
        },
        other => other,
    }
}

impl SemanticAnalyzer {
    pub(super) fn check_expr(&mut self, expr: &Spanned<Expr>) -> Result<Type, SemaError> {
        let ty = self.check_expr_kind(expr)?;
        self.record(expr.span, expr.node.kind(), ty.clone());
        Ok(ty)
    }

    /// The value of a comptime expression that was checked as `ty`, when
    /// every branch it may take yields that same constant
    fn constant_value(&self, expr: &Spanned<Expr>, ty: &Type) -> Option<ConstValue> {
        let value = comptime_value(ty)?;
        let mut values = Vec::new();
        branch_values(expr, &mut values);
        values
            .iter()
            .all(|value| self.types.get_expr(value) == Some(ty))
            .then_some(value)
    }

    fn check_expr_kind(&mut self, expr: &Spanned<Expr>) -> Result<Type, SemaError> {
        match &expr.node {
            Expr::Literal(lit) => Ok(literal_type(lit)),
            Expr::Identifier(name) => self.check_identifier(name, expr.span),
            Expr::Array(elements) => elements
                .iter()
                .map(|e| self.check_expr(e))
                .collect::<Result<Vec<_>, _>>()
                .map(Type::ComptimeList),
            Expr::Tuple(fields) => self.check_tuple(fields),
            Expr::Group(inner) => self.check_expr(inner),
            Expr::Annotation { expr: inner, ty } => {
                let target = self.resolve_type(ty)?;
                let inner_ty = self.check_expr(inner)?;
                let target = fill_inferred_size(&target, &inner_ty);
                self.coerce_checked(inner, &target)?;
                Ok(target)
            }
            Expr::Cast { expr: inner, target } => self.check_cast(inner, target),
            Expr::Unary { op, operand } => self.check_unary(*op, operand, expr.span),
            Expr::Binary { left, op, right } => self.check_binary(left, *op, right, expr.span),
            Expr::Call { callee, args } => self.check_call(callee, args, expr.span),
            Expr::Member { object, member } => self.check_member(object, member),
            Expr::Index { object, index } => self.check_index(object, index),
            Expr::If {
                condition,
                then_branch,
                else_branch,
            } => self.check_if(condition, then_branch, else_branch.as_ref(), expr.span),
            Expr::Match { scrutinee, arms } => self.check_match(scrutinee, arms, expr.span),
        }
    }

    fn check_identifier(&mut self, name: &str, span: Span) -> Result<Type, SemaError> {
        let info = self.table.lookup(name).ok_or_else(|| SemaError::UndefinedSymbol {
            name: name.to_string(),
            span,
        })?;
        let (kind, ty) = (info.kind, info.ty.clone());
        match kind {
            SymbolKind::Type => Err(SemaError::Custom {
                message: format!("'{}' is a type, not a value", name),
                span,
            }),
            SymbolKind::Def => {
                self.def_uses.insert(span, name.to_string());
                Ok(ty)
            }
            _ => Ok(ty),
        }
    }

    fn check_tuple(&mut self, fields: &[TupleFieldInit]) -> Result<Type, SemaError> {
        let mut resolved: Vec<TupleField> = Vec::with_capacity(fields.len());
        for field in fields {
            let name = field.name.as_ref().map(|n| n.node.clone());
            if let Some(field_name) = &field.name
                && resolved.iter().any(|f| f.name.as_deref() == Some(field_name.node.as_str()))
            {
                return Err(SemaError::DuplicateSymbol {
                    name: field_name.node.clone(),
                    span: field_name.span,
                    previous_span: None,
                });
            }
            resolved.push(TupleField {
                name,
                ty: self.check_expr(&field.value)?,
            });
        }
        Ok(Type::Tuple(resolved))
    }

    fn check_cast(&mut self, inner: &Spanned<Expr>, target: &Spanned<TypeExpr>) -> Result<Type, SemaError> {
        let target_ty = self.resolve_type(target)?;
        let source = self.check_expr(inner)?;

        if source.is_comptime_number() {
            // A constant that fits is built directly as the target
            if self.constant_value(inner, &source).is_some()
                && type_assign_result(&target_ty, &source).is_assignable()
            {
                self.settle(inner, &target_ty);
                return Ok(target_ty);
            }
            let concrete = self.concretize_expr(inner, &source)?;
            return if valid_cast(&target_ty, &concrete) {
                Ok(target_ty)
            } else {
                Err(SemaError::InvalidCast {
                    from: concrete.display_name(),
                    to: target_ty.display_name(),
                    span: inner.span,
                })
            };
        }

        if !source.is_concrete() {
            // Aggregate literals are shaped by the cast like an annotation
            let target_ty = fill_inferred_size(&target_ty, &source);
            self.coerce_checked(inner, &target_ty)?;
            return Ok(target_ty);
        }

        if valid_cast(&target_ty, &source) {
            Ok(target_ty)
        } else {
            Err(SemaError::InvalidCast {
                from: source.display_name(),
                to: target_ty.display_name(),
                span: inner.span,
            })
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Spanned<Expr>, span: Span) -> Result<Type, SemaError> {
        if op == UnaryOp::AddrOf && !is_place(&operand.node) {
            return Err(SemaError::Custom {
                message: "cannot take the address of a temporary value".to_string(),
                span,
            });
        }

        let mut ty = self.check_expr(operand)?;
        let invalid = |ty: &Type| SemaError::InvalidUnaryOp {
            op: op.symbol().to_string(),
            operand_ty: ty.display_name(),
            span,
        };

        match op {
            UnaryOp::Neg | UnaryOp::BitNot => {
                if let Some(value) = self.constant_value(operand, &ty) {
                    return match const_eval::fold_unary(op, value, span) {
                        Ok(ConstValue::Int(n)) => Ok(Type::ComptimeInt(n)),
                        Ok(ConstValue::Float(f)) => Ok(Type::ComptimeFloat(f)),
                        _ => Err(invalid(&ty)),
                    };
                }
                // Branches with differing constants are a runtime value
                if ty.is_comptime_number() {
                    ty = self.concretize_expr(operand, &ty)?;
                }
                let valid = numeric_prim(&ty).is_some_and(|p| match op {
                    UnaryOp::Neg => p.is_signed(),
                    _ => p.is_integer(),
                });
                if valid { Ok(ty) } else { Err(invalid(&ty)) }
            }
            UnaryOp::Not => {
                if ty.is_bool() {
                    Ok(ty)
                } else {
                    Err(invalid(&ty))
                }
            }
            UnaryOp::Deref => match ty.unalias() {
                Type::Pointer(pointee) => Ok((**pointee).clone()),
                _ => Err(invalid(&ty)),
            },
            UnaryOp::AddrOf => {
                if ty.is_concrete() {
                    Ok(Type::Pointer(Box::new(ty)))
                } else {
                    Err(invalid(&ty))
                }
            }
        }
    }

    fn check_binary(
        &mut self,
        left: &Spanned<Expr>,
        op: BinaryOp,
        right: &Spanned<Expr>,
        span: Span,
    ) -> Result<Type, SemaError> {
        if op.is_logical() {
            self.coerce(left, &Self::bool_type())?;
            self.coerce(right, &Self::bool_type())?;
            return Ok(Self::bool_type());
        }

        let mut lt = self.check_expr(left)?;
        let mut rt = self.check_expr(right)?;
        let constants = (self.constant_value(left, &lt), self.constant_value(right, &rt));

        // An operand whose branches differ is not folded. With no concrete
        // side to follow it takes its default type and the other side is
        // coerced to that.
        if lt.is_comptime_number() && rt.is_comptime_number() {
            if constants.0.is_none() {
                lt = self.concretize_expr(left, &lt)?;
            } else if constants.1.is_none() {
                rt = self.concretize_expr(right, &rt)?;
            }
        }

        let invalid = || SemaError::InvalidBinaryOp {
            op: op.symbol().to_string(),
            left_ty: lt.display_name(),
            right_ty: rt.display_name(),
            span,
        };

        // Comptime operands fold exactly
        if let (Some(l), Some(r)) = constants {
            let is_float = matches!(l, ConstValue::Float(_)) || matches!(r, ConstValue::Float(_));
            if is_float && (op.is_bitwise() || op == BinaryOp::Rem) {
                return Err(invalid());
            }
            return match const_eval::fold_binary(op, &l, &r, span)? {
                ConstValue::Int(n) => Ok(Type::ComptimeInt(n)),
                ConstValue::Float(f) => Ok(Type::ComptimeFloat(f)),
                ConstValue::Bool(_) => Ok(Self::bool_type()),
                _ => Err(invalid()),
            };
        }

        let operand = match (lt.is_comptime_number(), rt.is_comptime_number()) {
            (true, false) => {
                self.coerce_checked(left, &rt)?;
                rt.clone()
            }
            (false, true) => {
                self.coerce_checked(right, &lt)?;
                lt.clone()
            }
            _ if type_assignable(&lt, &rt) => lt.clone(),
            _ if type_assignable(&rt, &lt) => rt.clone(),
            _ => return Err(invalid()),
        };

        if op.is_comparison() {
            let valid = match op {
                BinaryOp::Eq | BinaryOp::Ne => {
                    numeric_prim(&operand).is_some()
                        || operand.underlying().is_bool()
                        || operand.underlying().is_pointer()
                }
                _ => numeric_prim(&operand).is_some(),
            };
            return if valid { Ok(Self::bool_type()) } else { Err(invalid()) };
        }

        let prim = numeric_prim(&operand).ok_or_else(invalid)?;
        if (op.is_bitwise() && !prim.is_integer()) || (op == BinaryOp::Rem && prim.is_float()) {
            return Err(invalid());
        }
        Ok(operand)
    }

    fn check_call(
        &mut self,
        callee: &Spanned<Expr>,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> Result<Type, SemaError> {
        let callee_ty = self.check_expr(callee)?;
        let Type::Func(func) = callee_ty.unalias().clone() else {
            for arg in args {
                self.report(|this| this.check_expr(arg).map(|_| ()));
            }
            return Err(SemaError::NotCallable {
                ty: callee_ty.display_name(),
                span: callee.span,
            });
        };

        if func.params.len() != args.len() {
            self.errors.push(SemaError::ArityMismatch {
                expected: func.params.len(),
                found: args.len(),
                span,
            });
        }

        for (index, arg) in args.iter().enumerate() {
            match func.params.get(index) {
                Some(param) => {
                    self.report(|this| this.coerce(arg, param).map_err(|e| argument_error(index, e)))
                }
                None => self.report(|this| {
                    let ty = this.check_expr(arg)?;
                    if !ty.is_concrete() {
                        this.concretize_expr(arg, &ty)?;
                    }
                    Ok(())
                }),
            }
        }

        Ok(match func.returns.as_slice() {
            [] => Type::Void,
            [single] => single.clone(),
            many => Type::tuple(many.to_vec()),
        })
    }

    fn check_member(&mut self, object: &Spanned<Expr>, member: &Spanned<String>) -> Result<Type, SemaError> {
        let object_ty = self.check_expr(object)?;
        // One level of pointer is looked through
        let base = match object_ty.unalias() {
            Type::Pointer(pointee) => pointee.unalias(),
            other => other,
        };

        let found = match base {
            Type::Tuple(fields) => fields
                .iter()
                .position(|f| f.name.as_deref() == Some(member.node.as_str()))
                .or_else(|| member.node.parse::<usize>().ok().filter(|i| *i < fields.len()))
                .map(|i| fields[i].ty.clone()),
            Type::Indexed(_) if member.node == "len" => Some(Type::Primitive(PrimitiveType::U32)),
            Type::ComptimeList(elements) if member.node == "len" => {
                Some(Type::ComptimeInt(BigInt::from(elements.len())))
            }
            _ => None,
        };

        found.ok_or_else(|| SemaError::FieldNotFound {
            ty: object_ty.display_name(),
            field: member.node.clone(),
            span: member.span,
        })
    }

    fn check_index(&mut self, object: &Spanned<Expr>, index: &Spanned<Expr>) -> Result<Type, SemaError> {
        let mut object_ty = self.check_expr(object)?;
        // A list literal is indexed as the array it defaults to
        if matches!(object_ty, Type::ComptimeList(_)) {
            object_ty = self.concretize_expr(object, &object_ty)?;
        }
        let (element, len) = match object_ty.unalias() {
            Type::Indexed(ix) => ((*ix.element).clone(), ix.fixed_len()),
            _ => {
                return Err(SemaError::TypeMismatch {
                    expected: "an array or slice".to_string(),
                    found: object_ty.display_name(),
                    span: object.span,
                });
            }
        };

        let index_ty = self.check_expr(index)?;
        match &index_ty {
            Type::ComptimeInt(_) => {
                // Every constant a branching index may take is in bounds
                if let Some(len) = len {
                    let mut values = Vec::new();
                    branch_values(index, &mut values);
                    for value in values {
                        if let Some(Type::ComptimeInt(n)) = self.types.get_expr(value)
                            && n.sign() != Sign::Minus
                            && *n >= BigInt::from(len)
                        {
                            return Err(SemaError::IndexOutOfBounds {
                                index: n.to_string(),
                                len,
                                span: value.span,
                            });
                        }
                    }
                }
                self.coerce_checked(index, &Type::Primitive(PrimitiveType::U32))?;
            }
            ty if numeric_prim(ty).is_some_and(|p| p.is_integer()) => {}
            ty => {
                return Err(SemaError::TypeMismatch {
                    expected: "an integer index".to_string(),
                    found: ty.display_name(),
                    span: index.span,
                });
            }
        }
        Ok(element)
    }

    fn check_if(
        &mut self,
        condition: &Spanned<Expr>,
        then_branch: &Block,
        else_branch: Option<&Block>,
        span: Span,
    ) -> Result<Type, SemaError> {
        self.coerce(condition, &Self::bool_type())?;
        let then_ty = self.check_block(then_branch, None);

        let Some(else_branch) = else_branch else {
            if !matches!(then_ty, Type::Void) {
                return Err(SemaError::TypeMismatch {
                    expected: Type::Void.display_name(),
                    found: then_ty.display_name(),
                    span: then_branch.value.as_ref().map_or(span, |v| v.span),
                });
            }
            return Ok(Type::Void);
        };

        let else_ty = self.check_block(else_branch, None);
        self.join_branches(
            &[
                (then_branch.value.as_deref(), then_ty),
                (else_branch.value.as_deref(), else_ty),
            ],
            span,
        )
    }

    fn check_match(
        &mut self,
        scrutinee: &Spanned<Expr>,
        arms: &[MatchArm],
        span: Span,
    ) -> Result<Type, SemaError> {
        let scrutinee_ty = self.check_expr(scrutinee)?;
        let scrutinee_ty = if scrutinee_ty.is_concrete() {
            scrutinee_ty
        } else {
            self.concretize_expr(scrutinee, &scrutinee_ty)?
        };

        let mut branches = Vec::with_capacity(arms.len());
        for arm in arms {
            if let MatchPattern::Value(pattern) = &arm.pattern {
                self.report(|this| this.coerce(pattern, &scrutinee_ty));
            }
            match self.check_expr(&arm.body) {
                Ok(ty) => branches.push((Some(&arm.body), ty)),
                Err(err) => self.errors.push(err),
            }
        }

        if branches.is_empty() {
            return Ok(Type::Void);
        }
        self.join_branches(&branches, span)
    }

    /// Common type of the values of `if`/`match` branches.
    ///
    /// If any branch is concrete, the widest concrete type wins and comptime
    /// branches are coerced to it. Otherwise a comptime representative is
    /// kept and each branch is checked again when the whole is coerced.
    fn join_branches(
        &mut self,
        branches: &[(Option<&Spanned<Expr>>, Type)],
        span: Span,
    ) -> Result<Type, SemaError> {
        let concrete: Vec<&Type> = branches
            .iter()
            .map(|(_, ty)| ty)
            .filter(|ty| ty.is_concrete())
            .collect();

        if let Some(first) = concrete.first() {
            let target = concrete
                .iter()
                .find(|candidate| concrete.iter().all(|ty| type_assignable(candidate, ty)))
                .map(|ty| (*ty).clone())
                .ok_or_else(|| SemaError::TypeMismatch {
                    expected: first.display_name(),
                    found: concrete
                        .iter()
                        .find(|ty| !type_assignable(first, ty))
                        .map_or_else(String::new, |ty| ty.display_name()),
                    span,
                })?;
            for (value, ty) in branches {
                if let Some(value) = value
                    && !ty.is_concrete()
                {
                    self.coerce_checked(value, &target)?;
                }
            }
            return Ok(target);
        }

        let mut joined = branches[0].1.clone();
        for (_, ty) in &branches[1..] {
            joined = match (&joined, ty) {
                (Type::ComptimeInt(_), Type::ComptimeFloat(_)) => ty.clone(),
                (
                    Type::ComptimeInt(_) | Type::ComptimeFloat(_),
                    Type::ComptimeInt(_) | Type::ComptimeFloat(_),
                ) => joined.clone(),
                (Type::ComptimeList(_), Type::ComptimeList(_)) => joined.clone(),
                _ => {
                    return Err(SemaError::TypeMismatch {
                        expected: joined.display_name(),
                        found: ty.display_name(),
                        span,
                    });
                }
            };
        }
        Ok(joined)
    }
}
