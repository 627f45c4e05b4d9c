//! Quill - static semantics for a small systems language targeting WebAssembly
//!
//! This crate type checks a parsed module and lays out its literal data in
//! linear memory. Parsing and code generation live elsewhere; the AST in
//! [`ast`] is the contract with the parser, and [`sema::CheckResult`] plus
//! [`data::DataLayout`] are the contract with the code generator.

pub mod ast;
pub mod config;
pub mod data;
pub mod sema;

// Re-export commonly used types
pub use ast::{SourceFile, Span, Spanned};
pub use config::Config;
pub use data::{DataLayout, LayoutError};
pub use sema::{CheckResult, SemaError};

/// Everything known about a module after checking and layout
#[derive(Debug, Clone)]
pub struct Analysis {
    pub check: CheckResult,
    pub layout: DataLayout,
}

impl Analysis {
    /// No type errors and no overlapping data
    pub fn is_ok(&self) -> bool {
        self.check.is_ok() && self.layout.errors.is_empty()
    }
}

/// Check a module, then lay out the literals it uses.
///
/// Type errors do not stop layout; the literals that were collected are
/// still placed so every diagnostic surfaces in one run.
#[tracing::instrument(level = "debug", skip_all, fields(items = ast.items.len()))]
pub fn analyze_module(ast: &SourceFile, config: &Config) -> Result<Analysis, LayoutError> {
    let check = sema::check_with_config(ast, &config.check);
    let layout = data::layout(&check.qualified_literals(), &config.layout)?;
    Ok(Analysis { check, layout })
}
