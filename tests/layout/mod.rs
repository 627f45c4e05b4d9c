//! Checking followed by data layout
//!
//! Literals are collected from checked modules and placed; assertions read
//! the resulting memory image back.

use pretty_assertions::assert_eq;
use quill::ast::{IndexSize, PrefixWidth, PrimitiveType, Specifier};
use quill::config::{Config, LayoutConfig};
use quill::data::DataRef;
use quill::sema::TypeKey;
use quill::{Analysis, analyze_module};

use crate::common::*;

/// Placement of the literal built from `expr`
fn placed(analysis: &Analysis, expr: &E) -> DataRef {
    let literal = analysis
        .check
        .literal_at(TypeKey::of_expr(expr))
        .unwrap_or_else(|| panic!("no literal collected for {:?}", expr.node));
    analysis
        .layout
        .get(literal.id)
        .unwrap_or_else(|| panic!("literal {} was not placed", literal.id))
}

fn bytes_at(analysis: &Analysis, data: DataRef) -> Vec<u8> {
    (data.ptr..data.ptr + data.len)
        .map(|address| analysis.layout.byte_at(address))
        .collect()
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn string_literal_is_placed() {
    let a = Ast::new();
    let hello = a.string("hello");
    let analysis = analyze_items(vec![a.main(vec![a.let_("s", None, hello.clone())])]);
    assert!(analysis.is_ok());
    assert_eq!(placed(&analysis, &hello), DataRef { ptr: 0, len: 5 });
    assert_eq!(analysis.layout.to_bytes(), b"hello".to_vec());
}

#[test]
fn identical_strings_share_storage() {
    let a = Ast::new();
    let first = a.string("hello");
    let second = a.string("hello");
    let analysis = analyze_items(vec![a.main(vec![
        a.let_("a", None, first.clone()),
        a.let_("b", None, second.clone()),
    ])]);
    assert_eq!(placed(&analysis, &first), placed(&analysis, &second));
    assert_eq!(analysis.layout.total_size, 5);
}

#[test]
fn substring_reuses_earlier_string() {
    let a = Ast::new();
    let outer = a.string("hello");
    let inner = a.string("ell");
    let analysis = analyze_items(vec![a.main(vec![
        a.let_("a", None, outer.clone()),
        a.let_("b", None, inner.clone()),
    ])]);
    assert_eq!(placed(&analysis, &inner), DataRef { ptr: 1, len: 3 });
    assert_eq!(analysis.layout.total_size, 5);
}

#[test]
fn null_terminated_string() {
    let a = Ast::new();
    let hi = a.string("hi");
    let analysis = analyze_items(vec![a.main(vec![a.let_("s", Some(a.cstr()), hi.clone())])]);
    let data = placed(&analysis, &hi);
    assert_eq!(bytes_at(&analysis, data), b"hi\0".to_vec());
}

#[test]
fn length_prefixed_string() {
    let a = Ast::new();
    let abc = a.string("abc");
    let ty = a.indexed(a.u8(), IndexSize::Slice, vec![Specifier::Prefix(PrefixWidth::Leb128)]);
    let analysis = analyze_items(vec![a.main(vec![a.let_("s", Some(ty), abc.clone())])]);
    let data = placed(&analysis, &abc);
    assert_eq!(bytes_at(&analysis, data), vec![3, b'a', b'b', b'c']);
}

#[test]
fn string_table_points_at_terminated_strings() {
    let a = Ast::new();
    let table = a.array(vec![a.string("hi"), a.string("yo")]);
    let ty = a.array_of(a.cstr(), 2);
    let analysis = analyze_items(vec![a.main(vec![a.let_("t", Some(ty), table.clone())])]);
    assert!(analysis.is_ok());

    assert_eq!(placed(&analysis, &table), DataRef { ptr: 6, len: 8 });
    let mut expected = b"hi\0yo\0".to_vec();
    expected.extend([0, 0, 0, 0, 3, 0, 0, 0]);
    assert_eq!(analysis.layout.to_bytes(), expected);
}

#[test]
fn def_is_placed_where_used() {
    let a = Ast::new();
    let use_site = a.ident("GREETING");
    let analysis = analyze_items(vec![
        a.def("GREETING", None, a.string("hey")),
        a.main(vec![a.let_("g", None, use_site.clone())]),
    ]);
    assert!(analysis.is_ok());
    assert_eq!(bytes_at(&analysis, placed(&analysis, &use_site)), b"hey".to_vec());
}

// ============================================================================
// Arrays
// ============================================================================

#[test]
fn integer_array_is_little_endian() {
    let a = Ast::new();
    let list = a.array(vec![a.int(1), a.int(2), a.int(0x0302)]);
    let ty = a.array_of(a.prim(PrimitiveType::U16), 3);
    let analysis = analyze_items(vec![a.main(vec![a.let_("xs", Some(ty), list.clone())])]);
    let data = placed(&analysis, &list);
    assert_eq!(bytes_at(&analysis, data), vec![1, 0, 2, 0, 2, 3]);
}

#[test]
fn default_int_array_with_negative_value() {
    let a = Ast::new();
    let neg = a.unary(quill::ast::UnaryOp::Neg, a.int(1));
    let list = a.array(vec![a.int(1), neg]);
    let analysis = analyze_items(vec![a.main(vec![a.let_("xs", None, list.clone())])]);
    let data = placed(&analysis, &list);
    assert_eq!(bytes_at(&analysis, data), vec![1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
}

#[test]
fn runtime_array_is_not_placed() {
    let a = Ast::new();
    let list = a.array(vec![a.ident("x"), a.int(2)]);
    let analysis = analyze_items(vec![a.main(vec![
        a.let_("x", Some(a.i32()), a.int(1)),
        a.let_("xs", None, list.clone()),
    ])]);
    assert!(analysis.is_ok());
    assert!(analysis.check.literal_at(TypeKey::of_expr(&list)).is_none());
    assert_eq!(analysis.layout.total_size, 0);
}

// ============================================================================
// Data segments
// ============================================================================

#[test]
fn data_segment_keeps_its_address() {
    let a = Ast::new();
    let analysis = analyze_items(vec![
        a.memory(1, vec![(16, None, a.string("data"))]),
        a.main(vec![a.let_("s", None, a.string("xyz"))]),
    ]);
    assert!(analysis.is_ok());
    let bytes = analysis.layout.to_bytes();
    assert_eq!(&bytes[16..20], b"data");
    // Automatic placement starts after the explicit data
    assert_eq!(&bytes[20..23], b"xyz");
    assert_eq!(analysis.layout.total_size, 23);
}

#[test]
fn string_inside_data_segment_is_reused() {
    let a = Ast::new();
    let world = a.string("world");
    let analysis = analyze_items(vec![
        a.memory(1, vec![(0, None, a.string("hello world"))]),
        a.main(vec![a.let_("s", None, world.clone())]),
    ]);
    assert!(analysis.is_ok());
    assert_eq!(placed(&analysis, &world), DataRef { ptr: 6, len: 5 });
    assert_eq!(analysis.layout.total_size, 11);
}

#[test]
fn overlapping_segments_are_reported() {
    let a = Ast::new();
    let analysis = analyze_items(vec![a.memory(
        1,
        vec![(0, None, a.string("abcd")), (2, None, a.string("xy"))],
    )]);
    assert!(analysis.check.is_ok());
    assert!(!analysis.is_ok());
    assert_eq!(analysis.layout.errors.len(), 1);
    assert!(analysis.layout.errors[0].to_string().contains("overlaps"));
}

#[test]
fn adjacent_segments_do_not_overlap() {
    let a = Ast::new();
    let analysis = analyze_items(vec![a.memory(
        1,
        vec![(0, None, a.string("ab")), (2, None, a.string("cd"))],
    )]);
    assert!(analysis.is_ok());
    assert_eq!(analysis.layout.to_bytes(), b"abcd".to_vec());
}

// ============================================================================
// Configuration and determinism
// ============================================================================

#[test]
fn configured_base_address() {
    let a = Ast::new();
    let hi = a.string("hi");
    let config = Config {
        layout: LayoutConfig { base: 64 },
        ..Config::default()
    };
    let module = source(vec![a.main(vec![a.let_("s", None, hi.clone())])]);
    let analysis = analyze_module(&module, &config).expect("layout succeeds");
    assert_eq!(placed(&analysis, &hi), DataRef { ptr: 64, len: 2 });
}

#[test]
fn layout_is_deterministic() {
    let build = || {
        let a = Ast::new();
        vec![
            a.memory(1, vec![(8, None, a.string("seg"))]),
            a.main(vec![
                a.let_("t", Some(a.array_of(a.cstr(), 3)), a.array(vec![
                    a.string("one"),
                    a.string("two"),
                    a.string("one"),
                ])),
                a.let_("s", None, a.string("tw")),
                a.let_("xs", None, a.array(vec![a.int(5), a.int(6)])),
            ]),
        ]
    };
    let first = analyze_items(build());
    let second = analyze_items(build());
    assert!(first.is_ok());
    assert_eq!(first.layout, second.layout);
}
