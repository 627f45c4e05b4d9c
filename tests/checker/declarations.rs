//! Module-level declarations: constants, globals, types, functions,
//! exports and memory

use quill::ast::{NodeKind, PrimitiveType};

use crate::common::*;

// ============================================================================
// Constants and globals
// ============================================================================

#[test]
fn def_keeps_comptime_value() {
    let a = Ast::new();
    let result = check_items(vec![
        a.def("SIZE", None, a.int(300)),
        a.main(vec![
            a.let_("x", Some(a.prim(PrimitiveType::U16)), a.ident("SIZE")),
            a.let_("y", Some(a.u8()), a.ident("SIZE")),
        ]),
    ]);
    assert_eq!(messages(&result), vec!["constant value 300 does not fit in type u8"]);
}

#[test]
fn def_use_takes_context_type() {
    let a = Ast::new();
    let use_site = a.ident("SIZE");
    let result = check_items(vec![
        a.def("SIZE", None, a.int(7)),
        a.main(vec![a.let_("x", Some(a.u8()), use_site.clone())]),
    ]);
    assert_no_errors(&result);
    assert_eq!(type_of(&result, &use_site).to_string(), "u8");
}

#[test]
fn def_refers_to_earlier_def() {
    let a = Ast::new();
    let doubled = a.binary(a.ident("BASE"), quill::ast::BinaryOp::Mul, a.int(2));
    let result = check_items(vec![
        a.def("BASE", None, a.int(100)),
        a.def("DOUBLE", None, doubled),
        a.main(vec![a.let_("x", Some(a.u8()), a.ident("DOUBLE"))]),
    ]);
    assert_no_errors(&result);
}

#[test]
fn annotated_def_is_checked() {
    let a = Ast::new();
    let result = check_items(vec![a.def("SMALL", Some(a.u8()), a.int(256))]);
    assert_error_contains(&result, "does not fit in type u8");
}

#[test]
fn def_must_be_constant() {
    let a = Ast::new();
    let result = check_items(vec![
        a.global("g", Some(a.i32()), a.int(1), true),
        a.def("C", None, a.ident("g")),
    ]);
    assert_error_contains(&result, "value of 'C' must be a constant expression");
}

#[test]
fn global_initializer_must_be_constant() {
    let a = Ast::new();
    let one = a.function("one", vec![], vec![a.i32()], vec![a.ret(Some(a.int(1)))]);
    let result = check_items(vec![
        one,
        a.global("g", Some(a.i32()), a.call("one", vec![]), false),
    ]);
    assert_eq!(messages(&result), vec!["initializer of 'g' must be a constant expression"]);
}

#[test]
fn global_without_annotation_takes_default() {
    let a = Ast::new();
    let result = check_items(vec![a.global("g", None, a.int(1), true)]);
    assert_no_errors(&result);
    let info = result.table.lookup("g").expect("g is declared");
    assert_eq!(info.ty.to_string(), "i32");
}

// ============================================================================
// Functions and returns
// ============================================================================

#[test]
fn return_value_out_of_range() {
    let a = Ast::new();
    let f = a.function("f", vec![], vec![a.u8()], vec![a.ret(Some(a.int(300)))]);
    let result = check_items(vec![f]);
    assert_eq!(messages(&result), vec!["constant value 300 does not fit in type u8"]);
}

#[test]
fn bare_return_from_valued_function() {
    let a = Ast::new();
    let f = a.function("f", vec![], vec![a.i32()], vec![a.ret(None)]);
    let result = check_items(vec![f]);
    assert_eq!(messages(&result), vec!["type mismatch: expected i32, found void"]);
}

#[test]
fn bare_return_from_void_function() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![a.ret(None)])]);
    assert_no_errors(&result);
}

#[test]
fn parameters_are_in_scope() {
    let a = Ast::new();
    let f = a.function(
        "inc",
        vec![("n", a.prim(PrimitiveType::U64))],
        vec![a.prim(PrimitiveType::U64)],
        vec![a.ret(Some(a.binary(a.ident("n"), quill::ast::BinaryOp::Add, a.int(1))))],
    );
    let result = check_items(vec![f]);
    assert_no_errors(&result);
}

#[test]
fn duplicate_parameter() {
    let a = Ast::new();
    let f = a.function("f", vec![("x", a.i32()), ("x", a.i32())], vec![], vec![]);
    let result = check_items(vec![f]);
    assert_eq!(messages(&result), vec!["duplicate symbol 'x'"]);
}

#[test]
fn duplicate_function() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![]), a.main(vec![])]);
    assert_eq!(messages(&result), vec!["duplicate symbol 'main'"]);
}

#[test]
fn locals_do_not_leak_between_functions() {
    let a = Ast::new();
    let result = check_items(vec![
        a.function("f", vec![], vec![], vec![a.let_("x", None, a.int(1))]),
        a.function("g", vec![], vec![], vec![a.let_("y", None, a.ident("x"))]),
    ]);
    assert_eq!(messages(&result), vec!["undefined symbol 'x'"]);
}

// ============================================================================
// Type declarations
// ============================================================================

#[test]
fn type_forward_reference() {
    let a = Ast::new();
    let result = check_items(vec![
        a.type_decl("A", a.named("B"), false),
        a.type_decl("B", a.prim(PrimitiveType::U32), false),
        a.main(vec![a.let_("x", Some(a.named("A")), a.int(1))]),
    ]);
    assert_no_errors(&result);
}

#[test]
fn type_cycle() {
    let a = Ast::new();
    let result = check_items(vec![
        a.type_decl("A", a.named("B"), false),
        a.type_decl("B", a.named("A"), false),
    ]);
    assert_error_contains(&result, "refers to itself");
}

#[test]
fn self_referencing_pointer_type() {
    let a = Ast::new();
    let result = check_items(vec![a.type_decl("Node", a.ptr(a.named("Node")), false)]);
    assert_error_contains(&result, "type 'Node' refers to itself");
}

#[test]
fn duplicate_type() {
    let a = Ast::new();
    let result = check_items(vec![
        a.type_decl("T", a.i32(), false),
        a.type_decl("T", a.u8(), false),
    ]);
    assert_eq!(messages(&result), vec!["duplicate symbol 'T'"]);
}

#[test]
fn value_used_as_type() {
    let a = Ast::new();
    let result = check_items(vec![
        a.global("g", Some(a.i32()), a.int(1), true),
        a.main(vec![a.let_("x", Some(a.named("g")), a.int(1))]),
    ]);
    assert_eq!(messages(&result), vec!["'g' is not a type"]);
}

#[test]
fn unknown_type_name() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![a.let_("x", Some(a.named("Missing")), a.int(1))])]);
    assert_eq!(messages(&result), vec!["undefined symbol 'Missing'"]);
}

#[test]
fn type_decl_is_recorded() {
    let a = Ast::new();
    let decl = a.type_decl("Pair", a.tuple_ty(vec![(Some("a"), a.u8()), (Some("b"), a.u8())]), false);
    let result = check_items(vec![decl.clone()]);
    assert_no_errors(&result);
    let ty = result
        .types
        .get(decl.span, NodeKind::TypeDecl)
        .expect("type declaration is recorded");
    assert_eq!(ty.to_string(), "Pair");
    assert_eq!(ty.byte_size(), Some(2));
}

// ============================================================================
// Exports
// ============================================================================

#[test]
fn export_function_and_global() {
    let a = Ast::new();
    let result = check_items(vec![
        a.main(vec![]),
        a.global("g", Some(a.i32()), a.int(0), true),
        a.export("run", "main"),
        a.export("state", "g"),
    ]);
    assert_no_errors(&result);
}

#[test]
fn export_of_constant() {
    let a = Ast::new();
    let result = check_items(vec![a.def("LIMIT", None, a.int(1)), a.export("limit", "LIMIT")]);
    assert_eq!(
        messages(&result),
        vec!["cannot export 'LIMIT': not a function or global"]
    );
}

#[test]
fn export_of_unknown_symbol() {
    let a = Ast::new();
    let result = check_items(vec![a.export("run", "missing")]);
    assert_eq!(messages(&result), vec!["undefined symbol 'missing'"]);
}

#[test]
fn duplicate_export_name() {
    let a = Ast::new();
    let result = check_items(vec![
        a.main(vec![]),
        a.export("run", "main"),
        a.export("run", "main"),
    ]);
    assert_eq!(messages(&result), vec!["duplicate symbol 'run'"]);
}

// ============================================================================
// Memory
// ============================================================================

#[test]
fn data_segment_in_range() {
    let a = Ast::new();
    let result = check_items(vec![a.memory(1, vec![(16, None, a.string("data"))])]);
    assert_no_errors(&result);
    assert_eq!(result.literals.len(), 1);
    assert_eq!(result.literals[0].address, Some(16));
}

#[test]
fn data_segment_outside_memory() {
    let a = Ast::new();
    let result = check_items(vec![a.memory(1, vec![(70000, None, a.string("hi"))])]);
    assert_eq!(
        messages(&result),
        vec!["data segment at offset 70000 is outside the initial memory"]
    );
}

#[test]
fn data_segment_needs_literal() {
    let a = Ast::new();
    let result = check_items(vec![a.memory(1, vec![(0, None, a.int(5))])]);
    assert_error_contains(&result, "data segment value must be a string or array literal");
}

#[test]
fn data_segment_with_annotation() {
    let a = Ast::new();
    let list = a.array(vec![a.int(1), a.int(2)]);
    let result = check_items(vec![a.memory(
        1,
        vec![(0, Some(a.array_of(a.prim(PrimitiveType::U16), 2)), list)],
    )]);
    assert_no_errors(&result);
    let ty = quill::sema::types::Type::Indexed(result.literals[0].ty.clone());
    assert_eq!(ty.to_string(), "[u16; 2]");
}

#[test]
fn second_memory_declaration() {
    let a = Ast::new();
    let result = check_items(vec![a.memory(1, vec![]), a.memory(2, vec![])]);
    assert_eq!(messages(&result), vec!["duplicate symbol 'memory'"]);
}

// ============================================================================
// Type map
// ============================================================================

#[test]
fn lookup_by_offset() {
    let a = Ast::new();
    let literal = a.int(5);
    let result = check_items(vec![a.main(vec![a.let_("x", Some(a.u8()), literal.clone())])]);
    let ty = result
        .types
        .at_offset(literal.span.start, NodeKind::Literal)
        .expect("literal is typed");
    assert_eq!(ty.to_string(), "u8");
}

#[test]
fn no_comptime_types_remain() {
    let a = Ast::new();
    let result = check_items(vec![
        a.def("N", None, a.int(3)),
        a.main(vec![
            a.let_("x", None, a.binary(a.int(2), quill::ast::BinaryOp::Add, a.ident("N"))),
            a.expr_stmt(a.array(vec![a.float(1.0), a.int(2)])),
        ]),
    ]);
    assert_no_errors(&result);
    for (key, ty) in result.types.iter() {
        assert!(ty.is_concrete(), "{:?} still has type {}", key, ty);
    }
}
