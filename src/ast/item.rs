//! Top-level declaration AST nodes

use super::expr::Expr;
use super::span::Spanned;
use super::stmt::Block;
use super::types::TypeExpr;

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct FnParam {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeExpr>,
}

/// Function result, optionally named so the body can assign to it
#[derive(Debug, Clone, PartialEq)]
pub struct FnReturn {
    pub name: Option<Spanned<String>>,
    pub ty: Spanned<TypeExpr>,
}

/// A function definition
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Spanned<String>,
    pub params: Vec<FnParam>,
    pub returns: Vec<FnReturn>,
    pub body: Block,
}

/// What an import brings in from the host
#[derive(Debug, Clone, PartialEq)]
pub enum ImportItem {
    Func {
        name: Spanned<String>,
        params: Vec<FnParam>,
        returns: Vec<FnReturn>,
    },
    Global {
        name: Spanned<String>,
        ty: Spanned<TypeExpr>,
        mutable: bool,
    },
}

impl ImportItem {
    pub fn name(&self) -> &Spanned<String> {
        match self {
            ImportItem::Func { name, .. } | ImportItem::Global { name, .. } => name,
        }
    }
}

/// import "env" "log" fn log(x: i32);
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub field: String,
    pub item: ImportItem,
}

/// export "main" main;
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub external: String,
    pub symbol: Spanned<String>,
}

/// type Name = T; or type Name = unique T;
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: Spanned<String>,
    pub ty: Spanned<TypeExpr>,
    pub unique: bool,
}

/// Compile-time constant: def N = 4;
#[derive(Debug, Clone, PartialEq)]
pub struct Def {
    pub name: Spanned<String>,
    pub ty: Option<Spanned<TypeExpr>>,
    pub value: Spanned<Expr>,
}

/// Module-level variable: global mut counter: i32 = 0;
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub name: Spanned<String>,
    pub ty: Option<Spanned<TypeExpr>>,
    pub value: Spanned<Expr>,
    pub mutable: bool,
}

/// Data placed at a fixed byte offset of linear memory
#[derive(Debug, Clone, PartialEq)]
pub struct DataSegment {
    pub offset: Spanned<Expr>,
    pub ty: Option<Spanned<TypeExpr>>,
    pub value: Spanned<Expr>,
}

/// memory 1 4 { 0x100: "boot" }
#[derive(Debug, Clone, PartialEq)]
pub struct Memory {
    pub min_pages: u32,
    pub max_pages: Option<u32>,
    pub segments: Vec<DataSegment>,
}

/// A top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Import(Import),
    Export(Export),
    Function(Box<Function>),
    Type(TypeDecl),
    Def(Def),
    Global(Global),
    Memory(Memory),
}

/// A complete source file / compilation unit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    pub items: Vec<Spanned<Decl>>,
}

impl SourceFile {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_items(items: Vec<Spanned<Decl>>) -> Self {
        Self { items }
    }
}
