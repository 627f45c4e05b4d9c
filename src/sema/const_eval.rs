//! Constant Expression Evaluation
//!
//! Evaluates constant expressions at compile time. Integers are exact at any
//! width; the checker uses the folding helpers for comptime arithmetic and
//! the literal collector uses the evaluator for data contents.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use rustc_hash::FxHashMap as HashMap;

use crate::ast::{BinaryOp, Expr, Literal, PrimitiveType, Span, Spanned, TypeExpr, UnaryOp};
use crate::sema::SemaError;

/// Largest shift accepted in a constant expression
const MAX_SHIFT: usize = 1024;

/// Result of constant evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(BigInt),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    List(Vec<ConstValue>),
    Tuple(Vec<ConstValue>),
}

/// Environment for constant evaluation (maps names to constant values)
pub type ConstEnv = HashMap<String, ConstValue>;

impl ConstValue {
    /// Numeric value as a float; integers round to the nearest value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Float(f) => Some(*f),
            ConstValue::Int(n) => n.to_f64(),
            _ => None,
        }
    }
}

fn not_constant(span: Span) -> SemaError {
    SemaError::Custom {
        message: "expression is not constant".to_string(),
        span,
    }
}

/// Evaluates a constant expression at compile time
pub fn eval_const_expr(expr: &Spanned<Expr>) -> Result<ConstValue, SemaError> {
    eval_const_expr_with_env(expr, &ConstEnv::default())
}

/// Evaluates a constant expression with an environment of named constants
pub fn eval_const_expr_with_env(
    expr: &Spanned<Expr>,
    env: &ConstEnv,
) -> Result<ConstValue, SemaError> {
    match &expr.node {
        Expr::Literal(lit) => Ok(eval_literal(lit)),
        Expr::Identifier(name) => env.get(name).cloned().ok_or_else(|| SemaError::Custom {
            message: format!("constant '{}' not found in this scope", name),
            span: expr.span,
        }),
        Expr::Binary { left, op, right } => {
            let l = eval_const_expr_with_env(left, env)?;
            let r = eval_const_expr_with_env(right, env)?;
            fold_binary(*op, &l, &r, expr.span)
        }
        Expr::Unary { op, operand } => {
            let value = eval_const_expr_with_env(operand, env)?;
            fold_unary(*op, value, expr.span)
        }
        Expr::Group(inner) => eval_const_expr_with_env(inner, env),
        Expr::Annotation { expr: inner, .. } => eval_const_expr_with_env(inner, env),
        Expr::Cast { expr: inner, target } => {
            let value = eval_const_expr_with_env(inner, env)?;
            apply_type_cast(value, target, expr.span)
        }
        Expr::Array(elements) => elements
            .iter()
            .map(|e| eval_const_expr_with_env(e, env))
            .collect::<Result<Vec<_>, _>>()
            .map(ConstValue::List),
        Expr::Tuple(fields) => fields
            .iter()
            .map(|f| eval_const_expr_with_env(&f.value, env))
            .collect::<Result<Vec<_>, _>>()
            .map(ConstValue::Tuple),
        _ => Err(not_constant(expr.span)),
    }
}

fn eval_literal(lit: &Literal) -> ConstValue {
    match lit {
        Literal::Int(n) => ConstValue::Int(n.clone()),
        Literal::Float(f) => ConstValue::Float(*f),
        Literal::Bool(b) => ConstValue::Bool(*b),
        Literal::String(bytes) => ConstValue::Bytes(bytes.clone()),
    }
}

/// Fold a binary operator over two constants
pub fn fold_binary(
    op: BinaryOp,
    left: &ConstValue,
    right: &ConstValue,
    span: Span,
) -> Result<ConstValue, SemaError> {
    match (left, right) {
        (ConstValue::Int(l), ConstValue::Int(r)) => fold_int(op, l, r, span),
        (ConstValue::Bool(l), ConstValue::Bool(r)) => fold_bool(op, *l, *r, span),
        (ConstValue::Float(_), _) | (_, ConstValue::Float(_)) => {
            match (left.as_f64(), right.as_f64()) {
                (Some(l), Some(r)) => fold_float(op, l, r, span),
                _ => Err(invalid_constant_op(op, span)),
            }
        }
        _ => Err(invalid_constant_op(op, span)),
    }
}

fn invalid_constant_op(op: BinaryOp, span: Span) -> SemaError {
    SemaError::Custom {
        message: format!("cannot evaluate '{}' on these constants", op.symbol()),
        span,
    }
}

/// Exact integer arithmetic; comparisons yield `Bool`
pub fn fold_int(op: BinaryOp, l: &BigInt, r: &BigInt, span: Span) -> Result<ConstValue, SemaError> {
    let zero = BigInt::from(0u8);
    let value = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div | BinaryOp::Rem => {
            if *r == zero {
                return Err(SemaError::Custom {
                    message: "division by zero in constant expression".to_string(),
                    span,
                });
            }
            if op == BinaryOp::Div { l / r } else { l % r }
        }
        BinaryOp::BitAnd => l & r,
        BinaryOp::BitOr => l | r,
        BinaryOp::BitXor => l ^ r,
        BinaryOp::Shl | BinaryOp::Shr => {
            let amount = usize::try_from(r)
                .ok()
                .filter(|n| *n <= MAX_SHIFT)
                .ok_or_else(|| SemaError::Custom {
                    message: "shift amount out of range in constant expression".to_string(),
                    span,
                })?;
            if op == BinaryOp::Shl { l << amount } else { l >> amount }
        }
        BinaryOp::Eq => return Ok(ConstValue::Bool(l == r)),
        BinaryOp::Ne => return Ok(ConstValue::Bool(l != r)),
        BinaryOp::Lt => return Ok(ConstValue::Bool(l < r)),
        BinaryOp::Le => return Ok(ConstValue::Bool(l <= r)),
        BinaryOp::Gt => return Ok(ConstValue::Bool(l > r)),
        BinaryOp::Ge => return Ok(ConstValue::Bool(l >= r)),
        BinaryOp::And | BinaryOp::Or => return Err(invalid_constant_op(op, span)),
    };
    Ok(ConstValue::Int(value))
}

/// Float arithmetic; bitwise operators are rejected
pub fn fold_float(op: BinaryOp, l: f64, r: f64, span: Span) -> Result<ConstValue, SemaError> {
    let value = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Eq => return Ok(ConstValue::Bool(l == r)),
        BinaryOp::Ne => return Ok(ConstValue::Bool(l != r)),
        BinaryOp::Lt => return Ok(ConstValue::Bool(l < r)),
        BinaryOp::Le => return Ok(ConstValue::Bool(l <= r)),
        BinaryOp::Gt => return Ok(ConstValue::Bool(l > r)),
        BinaryOp::Ge => return Ok(ConstValue::Bool(l >= r)),
        _ => return Err(invalid_constant_op(op, span)),
    };
    Ok(ConstValue::Float(value))
}

fn fold_bool(op: BinaryOp, l: bool, r: bool, span: Span) -> Result<ConstValue, SemaError> {
    let value = match op {
        BinaryOp::And => l && r,
        BinaryOp::Or => l || r,
        BinaryOp::Eq => l == r,
        BinaryOp::Ne => l != r,
        _ => return Err(invalid_constant_op(op, span)),
    };
    Ok(ConstValue::Bool(value))
}

pub fn fold_unary(op: UnaryOp, value: ConstValue, span: Span) -> Result<ConstValue, SemaError> {
    match (op, value) {
        (UnaryOp::Neg, ConstValue::Int(n)) => Ok(ConstValue::Int(-n)),
        (UnaryOp::Neg, ConstValue::Float(f)) => Ok(ConstValue::Float(-f)),
        (UnaryOp::BitNot, ConstValue::Int(n)) => Ok(ConstValue::Int(!n)),
        (UnaryOp::Not, ConstValue::Bool(b)) => Ok(ConstValue::Bool(!b)),
        (op, _) => Err(SemaError::Custom {
            message: format!("cannot evaluate '{}' on this constant", op.symbol()),
            span,
        }),
    }
}

/// Wrap an integer into the range of `prim` with two's complement semantics
pub fn wrap_to(value: &BigInt, prim: PrimitiveType) -> BigInt {
    let bits = prim.bits() as usize;
    let modulus = BigInt::from(1u8) << bits;
    let mut wrapped = value % &modulus;
    if wrapped < BigInt::from(0u8) {
        wrapped += &modulus;
    }
    if prim.is_signed() && wrapped >= (BigInt::from(1u8) << (bits - 1)) {
        wrapped -= modulus;
    }
    wrapped
}

/// Apply type cast to a constant value
fn apply_type_cast(
    value: ConstValue,
    target_type: &Spanned<TypeExpr>,
    span: Span,
) -> Result<ConstValue, SemaError> {
    let TypeExpr::Primitive(prim) = &target_type.node else {
        // Casts to named, pointer or aggregate types keep the value
        return Ok(value);
    };
    let prim = *prim;

    if prim.is_bool() {
        return match value {
            ConstValue::Bool(_) => Ok(value),
            _ => Err(SemaError::Custom {
                message: "cannot cast to bool".to_string(),
                span,
            }),
        };
    }

    if prim.is_float() {
        let f = value.as_f64().ok_or_else(|| SemaError::Custom {
            message: format!("cannot cast to {}", prim),
            span,
        })?;
        let f = if prim == PrimitiveType::F32 { f as f32 as f64 } else { f };
        return Ok(ConstValue::Float(f));
    }

    match value {
        ConstValue::Int(n) => Ok(ConstValue::Int(wrap_to(&n, prim))),
        ConstValue::Float(f) if f.is_finite() => {
            // Truncate toward zero, then wrap
            let truncated: BigInt = format!("{:.0}", f.trunc()).parse().map_err(|_| {
                SemaError::Custom {
                    message: format!("cannot cast {} to {}", f, prim),
                    span,
                }
            })?;
            Ok(ConstValue::Int(wrap_to(&truncated, prim)))
        }
        _ => Err(SemaError::Custom {
            message: format!("cannot cast to {}", prim),
            span,
        }),
    }
}
