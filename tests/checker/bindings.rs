//! Let bindings: default types, literal inference and implicit conversions

use quill::ast::{IndexSize, PrimitiveType, Specifier};

use crate::common::*;

/// Check `fn main` with the given body and return the displayed type of
/// the `n`th statement's binding
fn bound(a: &Ast, body: Vec<S>, n: usize) -> String {
    let main = a.main(body);
    let result = check_items(vec![main.clone()]);
    assert_no_errors(&result);
    binding_type(&result, &main, n).to_string()
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn int_literal_defaults_to_i32() {
    let a = Ast::new();
    assert_eq!(bound(&a, vec![a.let_("x", None, a.int(5))], 0), "i32");
}

#[test]
fn float_literal_defaults_to_f64() {
    let a = Ast::new();
    assert_eq!(bound(&a, vec![a.let_("x", None, a.float(1.5))], 0), "f64");
}

#[test]
fn string_literal_is_a_byte_array() {
    let a = Ast::new();
    assert_eq!(bound(&a, vec![a.let_("s", None, a.string("hi"))], 0), "[u8; 2]");
}

#[test]
fn literal_node_is_settled_to_default() {
    let a = Ast::new();
    let five = a.int(5);
    let result = check_items(vec![a.main(vec![a.let_("x", None, five.clone())])]);
    assert_no_errors(&result);
    assert_eq!(type_of(&result, &five).to_string(), "i32");
}

#[test]
fn configured_defaults_are_used() {
    let a = Ast::new();
    let main = a.main(vec![
        a.let_("x", None, a.int(5)),
        a.let_("y", None, a.float(0.5)),
    ]);
    let config = quill::config::CheckConfig {
        default_int: PrimitiveType::I64,
        default_float: PrimitiveType::F32,
    };
    let result = quill::sema::check_with_config(&source(vec![main.clone()]), &config);
    assert_no_errors(&result);
    assert_eq!(binding_type(&result, &main, 0).to_string(), "i64");
    assert_eq!(binding_type(&result, &main, 1).to_string(), "f32");
}

// ============================================================================
// Array literals
// ============================================================================

#[test]
fn int_list_defaults_element_type() {
    let a = Ast::new();
    let list = a.array(vec![a.int(1), a.int(2), a.int(3)]);
    assert_eq!(bound(&a, vec![a.let_("xs", None, list)], 0), "[i32; 3]");
}

#[test]
fn float_sibling_makes_list_float() {
    let a = Ast::new();
    let list = a.array(vec![a.int(1), a.float(2.5)]);
    assert_eq!(bound(&a, vec![a.let_("xs", None, list)], 0), "[f64; 2]");
}

#[test]
fn concrete_sibling_anchors_list() {
    let a = Ast::new();
    let body = vec![
        a.let_("b", Some(a.u8()), a.int(1)),
        a.let_("xs", None, a.array(vec![a.ident("b"), a.int(7)])),
    ];
    assert_eq!(bound(&a, body, 1), "[u8; 2]");
}

#[test]
fn anchored_list_element_out_of_range() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![
        a.let_("b", Some(a.u8()), a.int(1)),
        a.let_("xs", None, a.array(vec![a.ident("b"), a.int(300)])),
    ])]);
    assert_error_contains(&result, "constant value 300 does not fit in type u8");
}

#[test]
fn strings_of_different_length_become_slices() {
    let a = Ast::new();
    let list = a.array(vec![a.string("ab"), a.string("c")]);
    assert_eq!(bound(&a, vec![a.let_("xs", None, list)], 0), "[[u8]; 2]");
}

#[test]
fn empty_list_cannot_be_inferred() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![a.let_("xs", None, a.array(vec![]))])]);
    assert_error_contains(&result, "cannot infer type");
    assert_error_contains(&result, "empty array");
}

#[test]
fn empty_list_with_annotation_is_fine() {
    let a = Ast::new();
    let ty = a.slice_of(a.i32());
    let result = check_items(vec![a.main(vec![a.let_("xs", Some(ty), a.array(vec![]))])]);
    assert_no_errors(&result);
}

#[test]
fn inferred_size_is_filled_from_value() {
    let a = Ast::new();
    let ty = a.indexed(a.i32(), IndexSize::Inferred, vec![]);
    let list = a.array(vec![a.int(1), a.int(2)]);
    assert_eq!(bound(&a, vec![a.let_("xs", Some(ty), list)], 0), "[i32; 2]");
}

#[test]
fn fixed_size_must_match_element_count() {
    let a = Ast::new();
    let ty = a.array_of(a.i32(), 3);
    let list = a.array(vec![a.int(1), a.int(2)]);
    let result = check_items(vec![a.main(vec![a.let_("xs", Some(ty), list)])]);
    assert_error_contains(&result, "expected [i32; 3], found an array of 2 elements");
}

#[test]
fn nested_elements_are_recorded_with_element_type() {
    let a = Ast::new();
    let first = a.int(1);
    let ty = a.array_of(a.prim(PrimitiveType::U16), 2);
    let list = a.array(vec![first.clone(), a.int(2)]);
    let result = check_items(vec![a.main(vec![a.let_("xs", Some(ty), list)])]);
    assert_no_errors(&result);
    assert_eq!(type_of(&result, &first).to_string(), "u16");
}

#[test]
fn null_terminated_string_from_literal() {
    let a = Ast::new();
    assert_eq!(bound(&a, vec![a.let_("s", Some(a.cstr()), a.string("hi"))], 0), "[u8:0]");
}

#[test]
fn string_table_annotation() {
    let a = Ast::new();
    let ty = a.array_of(a.cstr(), 2);
    let list = a.array(vec![a.string("hi"), a.string("there")]);
    assert_eq!(bound(&a, vec![a.let_("t", Some(ty), list)], 0), "[[u8:0]; 2]");
}

#[test]
fn length_prefix_must_be_unsigned() {
    let a = Ast::new();
    let ty = a.indexed(
        a.u8(),
        IndexSize::Slice,
        vec![Specifier::Prefix(quill::ast::PrefixWidth::Fixed(PrimitiveType::I16))],
    );
    let result = check_items(vec![a.main(vec![a.let_("s", Some(ty), a.string("hi"))])]);
    assert_error_contains(&result, "length prefix must be an unsigned integer");
}

// ============================================================================
// Tuples
// ============================================================================

#[test]
fn tuple_literal_concretizes_each_field() {
    let a = Ast::new();
    let tuple = a.tuple(vec![(Some("x"), a.int(1)), (Some("y"), a.float(2.0))]);
    assert_eq!(bound(&a, vec![a.let_("t", None, tuple)], 0), "(x: i32, y: f64)");
}

#[test]
fn tuple_field_names_must_agree() {
    let a = Ast::new();
    let ty = a.tuple_ty(vec![(Some("x"), a.i32()), (Some("y"), a.i32())]);
    let tuple = a.tuple(vec![(Some("x"), a.int(1)), (Some("z"), a.int(2))]);
    let result = check_items(vec![a.main(vec![a.let_("t", Some(ty), tuple)])]);
    assert_error_contains(&result, "no field 'z'");
}

#[test]
fn duplicate_tuple_field_name() {
    let a = Ast::new();
    let tuple = a.tuple(vec![(Some("x"), a.int(1)), (Some("x"), a.int(2))]);
    let result = check_items(vec![a.main(vec![a.let_("t", None, tuple)])]);
    assert_error_contains(&result, "duplicate symbol 'x'");
}

// ============================================================================
// Implicit conversions
// ============================================================================

#[test]
fn constant_out_of_range() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![a.let_("x", Some(a.u8()), a.int(256))])]);
    assert_eq!(messages(&result), vec!["constant value 256 does not fit in type u8"]);
}

#[test]
fn folded_constant_out_of_range() {
    let a = Ast::new();
    let sum = a.binary(a.int(255), quill::ast::BinaryOp::Add, a.int(1));
    let result = check_items(vec![a.main(vec![a.let_("x", Some(a.u8()), sum)])]);
    assert_error_contains(&result, "constant value 256 does not fit in type u8");
}

#[test]
fn negative_constant_into_unsigned() {
    let a = Ast::new();
    let neg = a.unary(quill::ast::UnaryOp::Neg, a.int(1));
    let result = check_items(vec![a.main(vec![a.let_("x", Some(a.prim(PrimitiveType::U32)), neg)])]);
    assert_error_contains(&result, "constant value -1 does not fit in type u32");
}

#[test]
fn exactly_representable_constant_into_float() {
    let a = Ast::new();
    let f32 = || a.prim(PrimitiveType::F32);
    let result = check_items(vec![a.main(vec![
        a.let_("x", Some(f32()), a.int(1 << 30)),
        a.let_("y", Some(a.prim(PrimitiveType::F64)), a.int(1 << 60)),
        a.let_("z", Some(f32()), a.int((1 << 24) + 1)),
    ])]);
    assert_eq!(messages(&result), vec!["constant value 16777217 does not fit in type f32"]);
}

#[test]
fn widening_is_implicit() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![
        a.let_("x", Some(a.i32()), a.int(1)),
        a.let_("y", Some(a.prim(PrimitiveType::I64)), a.ident("x")),
        a.let_("f", Some(a.prim(PrimitiveType::F32)), a.float(1.0)),
        a.let_("g", Some(a.prim(PrimitiveType::F64)), a.ident("f")),
    ])]);
    assert_no_errors(&result);
}

#[test]
fn narrowing_needs_a_cast() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![
        a.let_("x", Some(a.i32()), a.int(1)),
        a.let_("y", Some(a.prim(PrimitiveType::I16)), a.ident("x")),
    ])]);
    assert_eq!(messages(&result), vec!["type mismatch: expected i16, found i32"]);
}

#[test]
fn sign_change_needs_a_cast() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![
        a.let_("x", Some(a.i32()), a.int(1)),
        a.let_("y", Some(a.prim(PrimitiveType::U32)), a.ident("x")),
    ])]);
    assert_error_contains(&result, "expected u32, found i32");
}

#[test]
fn int_is_not_bool() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![a.let_(
        "b",
        Some(a.prim(PrimitiveType::Bool)),
        a.int(1),
    )])]);
    assert_error_contains(&result, "bool");
}

#[test]
fn array_into_slice() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![
        a.let_("xs", Some(a.array_of(a.u8(), 3)), a.string("abc")),
        a.let_("s", Some(a.slice_of(a.u8())), a.ident("xs")),
    ])]);
    assert_no_errors(&result);
}

#[test]
fn slice_is_not_null_terminated() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![
        a.let_("s", Some(a.slice_of(a.u8())), a.string("abc")),
        a.let_("c", Some(a.cstr()), a.ident("s")),
    ])]);
    assert_eq!(messages(&result), vec!["type mismatch: expected [u8:0], found [u8]"]);
}

#[test]
fn alias_is_interchangeable() {
    let a = Ast::new();
    let result = check_items(vec![
        a.type_decl("Count", a.prim(PrimitiveType::U32), false),
        a.main(vec![
            a.let_("c", Some(a.named("Count")), a.int(1)),
            a.let_("u", Some(a.prim(PrimitiveType::U32)), a.ident("c")),
            a.let_("d", Some(a.named("Count")), a.ident("u")),
        ]),
    ]);
    assert_no_errors(&result);
}

#[test]
fn unique_type_accepts_constants_only() {
    let a = Ast::new();
    let result = check_items(vec![
        a.type_decl("Meters", a.i32(), true),
        a.main(vec![
            a.let_("m", Some(a.named("Meters")), a.int(5)),
            a.let_("n", Some(a.i32()), a.int(1)),
            a.let_("k", Some(a.named("Meters")), a.ident("n")),
            a.let_("j", Some(a.i32()), a.ident("m")),
        ]),
    ]);
    assert_eq!(
        messages(&result),
        vec![
            "type mismatch: expected Meters, found i32",
            "type mismatch: expected i32, found Meters",
        ]
    );
}

#[test]
fn unique_type_checks_constant_range() {
    let a = Ast::new();
    let result = check_items(vec![
        a.type_decl("Id", a.u8(), true),
        a.main(vec![a.let_("i", Some(a.named("Id")), a.int(1000))]),
    ]);
    assert_error_contains(&result, "does not fit in type Id");
}

#[test]
fn failed_binding_still_declares_annotated_name() {
    let a = Ast::new();
    let result = check_items(vec![a.main(vec![
        a.let_("x", Some(a.u8()), a.int(256)),
        a.let_("y", Some(a.u8()), a.ident("x")),
    ])]);
    assert_eq!(messages(&result).len(), 1);
}
