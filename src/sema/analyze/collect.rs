//! Literal collection
//!
//! Final walk over the checked module. Every string or array literal with
//! a constant value and an indexed type becomes a [`PendingLiteral`] for the
//! data layout engine; its nested literals are part of it and are not
//! collected again. Non-constant arrays are built at runtime, so the walk
//! descends into them instead.

use rustc_hash::FxHashMap as HashMap;

use crate::ast::visit::{self, Visit};
use crate::ast::{Decl, Expr, Literal, Span, Spanned};
use crate::data::{LiteralId, LiteralValue};
use crate::sema::const_eval::{ConstEnv, ConstValue, eval_const_expr_with_env};
use crate::sema::types::{IndexedType, Type};
use crate::sema::{PendingLiteral, SemaError, TypeKey, TypeMap};

pub(super) struct LiteralCollector<'a> {
    types: &'a TypeMap,
    env: &'a ConstEnv,
    def_uses: &'a HashMap<Span, String>,
    segment_offsets: &'a HashMap<Span, u32>,
    literals: Vec<PendingLiteral>,
    errors: Vec<SemaError>,
}

impl<'a> LiteralCollector<'a> {
    pub fn new(
        types: &'a TypeMap,
        env: &'a ConstEnv,
        def_uses: &'a HashMap<Span, String>,
        segment_offsets: &'a HashMap<Span, u32>,
    ) -> Self {
        Self {
            types,
            env,
            def_uses,
            segment_offsets,
            literals: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn finish(self) -> (Vec<PendingLiteral>, Vec<SemaError>) {
        (self.literals, self.errors)
    }

    fn is_candidate(&self, expr: &Spanned<Expr>) -> bool {
        match &expr.node {
            Expr::Literal(Literal::String(_)) | Expr::Array(_) => true,
            Expr::Identifier(_) => self.def_uses.contains_key(&expr.span),
            _ => false,
        }
    }

    /// Value of an expression that only refers to constants
    fn evaluate(&self, expr: &Spanned<Expr>) -> Option<ConstValue> {
        let mut finder = LocalRefFinder {
            def_uses: self.def_uses,
            found: false,
        };
        finder.visit_expr(expr);
        if finder.found {
            return None;
        }
        eval_const_expr_with_env(expr, self.env).ok()
    }

    /// Record `expr` as a literal. Returns false when it must be built at
    /// runtime from its parts.
    fn collect(&mut self, expr: &Spanned<Expr>) -> bool {
        let address = self.segment_offsets.get(&expr.span).copied();
        let Some(ty) = self
            .types
            .get_expr(expr)
            .and_then(Type::as_indexed)
            .filter(|ix| storable(ix))
        else {
            return false;
        };

        let value = self
            .evaluate(expr)
            .and_then(|value| literal_value(&value, ty));
        let Some(value) = value else {
            if address.is_some() {
                self.errors.push(SemaError::Custom {
                    message: "data segment value must be a constant expression".to_string(),
                    span: expr.span,
                });
            }
            return false;
        };

        let id = LiteralId(self.literals.len() as u32);
        tracing::trace!(%id, ty = %Type::Indexed(ty.clone()), ?address, "collected literal");
        self.literals.push(PendingLiteral {
            id,
            key: TypeKey::of_expr(expr),
            ty: ty.clone(),
            value,
            address,
        });
        true
    }
}

impl<'ast> Visit<'ast> for LiteralCollector<'_> {
    fn visit_decl(&mut self, i: &'ast Spanned<Decl>) {
        // Constants are materialized where they are used
        if matches!(i.node, Decl::Def(_)) {
            return;
        }
        visit::walk_decl(self, i)
    }

    fn visit_expr(&mut self, i: &'ast Spanned<Expr>) {
        if self.is_candidate(i) && self.collect(i) {
            return;
        }
        visit::walk_expr(self, i)
    }
}

/// Finds identifiers that do not name a `def`
struct LocalRefFinder<'a> {
    def_uses: &'a HashMap<Span, String>,
    found: bool,
}

impl<'ast> Visit<'ast> for LocalRefFinder<'_> {
    fn visit_expr(&mut self, i: &'ast Spanned<Expr>) {
        if let Expr::Identifier(_) = i.node
            && !self.def_uses.contains_key(&i.span)
        {
            self.found = true;
        }
        if !self.found {
            visit::walk_expr(self, i)
        }
    }
}

/// Only numbers and nested sequences of numbers can be laid out statically
fn storable(ty: &IndexedType) -> bool {
    match ty.element.underlying() {
        Type::Primitive(_) => true,
        Type::Indexed(inner) => storable(inner),
        _ => false,
    }
}

/// Shape a constant for the layout engine according to its type
fn literal_value(value: &ConstValue, ty: &IndexedType) -> Option<LiteralValue> {
    level_value(value, &ty.element, ty.specifiers.len())
}

/// Every framing specifier past the first adds a level of nesting to the value
fn level_value(value: &ConstValue, element: &Type, levels: usize) -> Option<LiteralValue> {
    if levels > 1 {
        let ConstValue::List(items) = value else {
            return None;
        };
        return items
            .iter()
            .map(|item| level_value(item, element, levels - 1))
            .collect::<Option<Vec<_>>>()
            .map(LiteralValue::List);
    }

    match (value, element.underlying()) {
        (ConstValue::List(items), Type::Indexed(inner)) => items
            .iter()
            .map(|item| literal_value(item, inner))
            .collect::<Option<Vec<_>>>()
            .map(LiteralValue::List),
        (ConstValue::Bytes(bytes), Type::Primitive(p)) if p.is_integer() => {
            if p.size_bytes() == 1 {
                Some(LiteralValue::Bytes(bytes.clone()))
            } else {
                Some(LiteralValue::Ints(bytes.iter().map(|&b| b.into()).collect()))
            }
        }
        (ConstValue::List(items), Type::Primitive(p)) if p.is_float() => items
            .iter()
            .map(ConstValue::as_f64)
            .collect::<Option<Vec<_>>>()
            .map(LiteralValue::Floats),
        (ConstValue::List(items), Type::Primitive(_)) => items
            .iter()
            .map(|item| match item {
                ConstValue::Int(n) => Some(n.clone()),
                ConstValue::Bool(b) => Some(u8::from(*b).into()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(LiteralValue::Ints),
        _ => None,
    }
}
