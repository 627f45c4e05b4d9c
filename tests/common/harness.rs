//! Test harness for checking and laying out modules

use quill::ast::{Decl, NodeKind, Spanned};
use quill::config::Config;
use quill::sema::types::Type;
use quill::sema::{CheckResult, check};
use quill::{Analysis, analyze_module};

use super::fixtures::{D, E, source};

/// Check a module built from `items`
pub fn check_items(items: Vec<D>) -> CheckResult {
    check(&source(items))
}

/// Check and lay out a module with the default configuration
#[allow(dead_code)]
pub fn analyze_items(items: Vec<D>) -> Analysis {
    analyze_module(&source(items), &Config::default()).expect("layout failed")
}

/// Every error message, rendered without positions
pub fn messages(result: &CheckResult) -> Vec<String> {
    result.errors.iter().map(|e| e.message()).collect()
}

#[allow(dead_code)]
pub fn assert_no_errors(result: &CheckResult) {
    assert!(result.errors.is_empty(), "unexpected errors: {:#?}", messages(result));
}

/// Assert that some error message contains `needle`
#[allow(dead_code)]
pub fn assert_error_contains(result: &CheckResult, needle: &str) {
    let messages = messages(result);
    assert!(
        messages.iter().any(|m| m.contains(needle)),
        "expected an error containing {:?}, got {:#?}",
        needle,
        messages
    );
}

/// Type recorded for an expression node
#[allow(dead_code)]
pub fn type_of(result: &CheckResult, expr: &E) -> Type {
    result
        .type_of(expr)
        .cloned()
        .unwrap_or_else(|| panic!("no type recorded for {:?}", expr.node))
}

/// Type recorded for the `n`th `let` pattern in `main`, counted in source order
#[allow(dead_code)]
pub fn binding_type(result: &CheckResult, item: &D, n: usize) -> Type {
    let Decl::Function(func) = &item.node else {
        panic!("not a function");
    };
    let stmt = &func.body.stmts[n];
    let quill::ast::Stmt::Let { pattern, .. } = &stmt.node else {
        panic!("statement {} is not a let", n);
    };
    pattern_type(result, pattern)
}

fn pattern_type(result: &CheckResult, pattern: &Spanned<quill::ast::Pattern>) -> Type {
    result
        .types
        .get(pattern.span, NodeKind::IdentifierPattern)
        .cloned()
        .unwrap_or_else(|| panic!("no type recorded for pattern {:?}", pattern.node))
}
