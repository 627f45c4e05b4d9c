//! AST construction helpers
//!
//! The parser is a separate component, so tests build trees directly.
//! Every node gets a fresh span, which keeps type map keys distinct.

use std::cell::Cell;

use num_bigint::BigInt;
use quill::ast::{
    BinaryOp, Block, DataSegment, Decl, Def, Export, Expr, FnParam, FnReturn, Function, Global,
    IndexSize, Literal, MatchArm, MatchPattern, Memory, Pattern, PrimitiveType, SourceFile, Span,
    Specifier, Spanned, Stmt, TupleFieldExpr, TupleFieldInit, TypeDecl, TypeExpr, UnaryOp,
};

pub type E = Spanned<Expr>;
pub type T = Spanned<TypeExpr>;
pub type S = Spanned<Stmt>;
pub type D = Spanned<Decl>;

#[derive(Default)]
pub struct Ast {
    next: Cell<usize>,
}

#[allow(dead_code)]
impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn span(&self) -> Span {
        let start = self.next.get();
        self.next.set(start + 2);
        Span::new(start, start + 1)
    }

    pub fn node<N>(&self, node: N) -> Spanned<N> {
        Spanned::new(node, self.span())
    }

    pub fn name(&self, name: &str) -> Spanned<String> {
        self.node(name.to_string())
    }

    // Types

    pub fn prim(&self, prim: PrimitiveType) -> T {
        self.node(TypeExpr::primitive(prim))
    }

    pub fn u8(&self) -> T {
        self.prim(PrimitiveType::U8)
    }

    pub fn i32(&self) -> T {
        self.prim(PrimitiveType::I32)
    }

    pub fn named(&self, name: &str) -> T {
        self.node(TypeExpr::named(name))
    }

    pub fn ptr(&self, pointee: T) -> T {
        self.node(TypeExpr::pointer(pointee))
    }

    pub fn indexed(&self, element: T, size: IndexSize, specifiers: Vec<Specifier>) -> T {
        self.node(TypeExpr::indexed(element, size, specifiers))
    }

    pub fn array_of(&self, element: T, len: u64) -> T {
        self.indexed(element, IndexSize::Fixed(len), vec![])
    }

    pub fn slice_of(&self, element: T) -> T {
        self.indexed(element, IndexSize::Slice, vec![])
    }

    /// `[u8:0]`
    pub fn cstr(&self) -> T {
        let element = self.u8();
        self.indexed(element, IndexSize::Slice, vec![Specifier::Null])
    }

    pub fn tuple_ty(&self, fields: Vec<(Option<&str>, T)>) -> T {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| TupleFieldExpr {
                name: name.map(|n| self.name(n)),
                ty,
            })
            .collect();
        self.node(TypeExpr::Tuple(fields))
    }

    // Expressions

    pub fn int(&self, value: i64) -> E {
        self.node(Expr::int(value))
    }

    pub fn big(&self, value: BigInt) -> E {
        self.node(Expr::Literal(Literal::Int(value)))
    }

    pub fn float(&self, value: f64) -> E {
        self.node(Expr::float(value))
    }

    pub fn boolean(&self, value: bool) -> E {
        self.node(Expr::bool(value))
    }

    pub fn string(&self, value: &str) -> E {
        self.node(Expr::string(value))
    }

    pub fn ident(&self, name: &str) -> E {
        self.node(Expr::ident(name))
    }

    pub fn array(&self, elements: Vec<E>) -> E {
        self.node(Expr::Array(elements))
    }

    pub fn tuple(&self, fields: Vec<(Option<&str>, E)>) -> E {
        let fields = fields
            .into_iter()
            .map(|(name, value)| TupleFieldInit {
                name: name.map(|n| self.name(n)),
                value,
            })
            .collect();
        self.node(Expr::Tuple(fields))
    }

    pub fn binary(&self, left: E, op: BinaryOp, right: E) -> E {
        self.node(Expr::binary(left, op, right))
    }

    pub fn unary(&self, op: UnaryOp, operand: E) -> E {
        self.node(Expr::unary(op, operand))
    }

    pub fn cast(&self, expr: E, target: T) -> E {
        self.node(Expr::Cast {
            expr: Box::new(expr),
            target,
        })
    }

    pub fn annotate(&self, expr: E, ty: T) -> E {
        self.node(Expr::Annotation {
            expr: Box::new(expr),
            ty,
        })
    }

    pub fn call(&self, callee: &str, args: Vec<E>) -> E {
        let callee = self.ident(callee);
        self.node(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }

    pub fn member(&self, object: E, member: &str) -> E {
        self.node(Expr::Member {
            object: Box::new(object),
            member: self.name(member),
        })
    }

    pub fn index(&self, object: E, index: E) -> E {
        self.node(Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
        })
    }

    pub fn group(&self, inner: E) -> E {
        self.node(Expr::Group(Box::new(inner)))
    }

    pub fn if_else(&self, condition: E, then_value: E, else_value: E) -> E {
        self.node(Expr::If {
            condition: Box::new(condition),
            then_branch: Block::with_value(vec![], then_value),
            else_branch: Some(Block::with_value(vec![], else_value)),
        })
    }

    pub fn match_(&self, scrutinee: E, arms: Vec<(Option<E>, E)>) -> E {
        let arms = arms
            .into_iter()
            .map(|(pattern, body)| MatchArm {
                pattern: pattern.map_or(MatchPattern::Wildcard, MatchPattern::Value),
                body,
            })
            .collect();
        self.node(Expr::Match {
            scrutinee: Box::new(scrutinee),
            arms,
        })
    }

    // Statements

    pub fn let_(&self, name: &str, ty: Option<T>, value: E) -> S {
        self.node(Stmt::Let {
            pattern: self.node(Pattern::Identifier(name.to_string())),
            ty,
            value,
        })
    }

    pub fn let_tuple(&self, names: &[&str], value: E) -> S {
        let items = names
            .iter()
            .map(|n| self.node(Pattern::Identifier(n.to_string())))
            .collect();
        self.node(Stmt::Let {
            pattern: self.node(Pattern::Tuple(items)),
            ty: None,
            value,
        })
    }

    pub fn assign(&self, target: E, value: E) -> S {
        self.node(Stmt::Assign { target, value })
    }

    pub fn expr_stmt(&self, expr: E) -> S {
        self.node(Stmt::Expr(expr))
    }

    pub fn ret(&self, value: Option<E>) -> S {
        self.node(Stmt::Return(value))
    }

    // Declarations

    pub fn function(&self, name: &str, params: Vec<(&str, T)>, returns: Vec<T>, body: Vec<S>) -> D {
        let params = params
            .into_iter()
            .map(|(n, ty)| FnParam { name: self.name(n), ty })
            .collect();
        let returns = returns.into_iter().map(|ty| FnReturn { name: None, ty }).collect();
        self.node(Decl::Function(Box::new(Function {
            name: self.name(name),
            params,
            returns,
            body: Block::new(body),
        })))
    }

    /// `fn main() { ... }`
    pub fn main(&self, body: Vec<S>) -> D {
        self.function("main", vec![], vec![], body)
    }

    pub fn def(&self, name: &str, ty: Option<T>, value: E) -> D {
        self.node(Decl::Def(Def {
            name: self.name(name),
            ty,
            value,
        }))
    }

    pub fn global(&self, name: &str, ty: Option<T>, value: E, mutable: bool) -> D {
        self.node(Decl::Global(Global {
            name: self.name(name),
            ty,
            value,
            mutable,
        }))
    }

    pub fn type_decl(&self, name: &str, ty: T, unique: bool) -> D {
        self.node(Decl::Type(TypeDecl {
            name: self.name(name),
            ty,
            unique,
        }))
    }

    pub fn export(&self, external: &str, symbol: &str) -> D {
        self.node(Decl::Export(Export {
            external: external.to_string(),
            symbol: self.name(symbol),
        }))
    }

    pub fn memory(&self, min_pages: u32, segments: Vec<(i64, Option<T>, E)>) -> D {
        let segments = segments
            .into_iter()
            .map(|(offset, ty, value)| DataSegment {
                offset: self.int(offset),
                ty,
                value,
            })
            .collect();
        self.node(Decl::Memory(Memory {
            min_pages,
            max_pages: None,
            segments,
        }))
    }
}

pub fn source(items: Vec<D>) -> SourceFile {
    SourceFile::with_items(items)
}
