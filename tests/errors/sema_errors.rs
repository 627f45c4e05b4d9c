//! Rendering of checker and layout diagnostics

use quill::Span;
use quill::data::{EncodeError, LayoutError, LiteralId, OverlapError};
use quill::sema::SemaError;

use crate::common::*;

#[test]
fn rendered_with_source_line() {
    let source = "fn main() {\n    let x: u8 = 256;\n}\n";
    let err = SemaError::ConstantOverflow {
        value: "256".to_string(),
        ty: "u8".to_string(),
        span: Span::new(28, 31),
    };
    let rendered = err.format_with_source_and_file(source, Some("main.ql"));
    assert!(rendered.starts_with("error: constant value 256 does not fit in type u8\n"));
    assert!(rendered.contains("--> main.ql:2:17"));
    assert!(rendered.contains("2 |     let x: u8 = 256;"));
    assert!(rendered.contains("^^^"));
}

#[test]
fn rendered_without_file_name() {
    let source = "let y = nope;";
    let err = SemaError::UndefinedSymbol {
        name: "nope".to_string(),
        span: Span::new(8, 12),
    };
    let rendered = err.format_with_source(source);
    assert!(rendered.contains("--> <input>:1:9"));
    assert!(rendered.ends_with("^^^^ undefined symbol 'nope'"));
}

#[test]
fn duplicate_points_at_previous_definition() {
    let source = "fn f() {}\nfn f() {}\n";
    let err = SemaError::DuplicateSymbol {
        name: "f".to_string(),
        span: Span::new(13, 14),
        previous_span: Some(Span::new(3, 4)),
    };
    let rendered = err.format_with_source(source);
    assert!(rendered.starts_with("error: duplicate symbol 'f' (previously defined at 1:4)"));
    assert_eq!(err.message(), "duplicate symbol 'f'");
}

#[test]
fn display_includes_byte_range() {
    let err = SemaError::InvalidCast {
        from: "f64".to_string(),
        to: "bool".to_string(),
        span: Span::new(40, 52),
    };
    assert_eq!(err.to_string(), "cannot cast f64 to bool at 40..52");
    assert_eq!(err.offset(), 40);
}

#[test]
fn errors_carry_the_span_of_the_offending_node() {
    let a = Ast::new();
    let value = a.int(256);
    let result = check_items(vec![a.main(vec![a.let_("x", Some(a.u8()), value.clone())])]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].span(), value.span);
}

#[test]
fn every_error_in_a_module_is_reported() {
    let a = Ast::new();
    let result = check_items(vec![
        a.main(vec![
            a.let_("x", Some(a.u8()), a.int(256)),
            a.let_("y", None, a.ident("missing")),
        ]),
        a.function("f", vec![], vec![a.i32()], vec![a.ret(None)]),
        a.export("f", "nothing"),
    ]);
    assert_eq!(
        messages(&result),
        vec![
            "constant value 256 does not fit in type u8",
            "undefined symbol 'missing'",
            "type mismatch: expected i32, found void",
            "undefined symbol 'nothing'",
        ]
    );
}

#[test]
fn overlap_message() {
    let err = OverlapError {
        offset: 2,
        length: 2,
        other_offset: 0,
        other_length: 4,
    };
    assert_eq!(
        err.to_string(),
        "data at offset 2 (length 2) overlaps entry at offset 0 (length 4)"
    );
}

#[test]
fn layout_error_messages() {
    let err = LayoutError::Encode {
        id: LiteralId(3),
        ty: "[u8; 2]".to_string(),
        source: EncodeError::Shape("expected 2 elements, found 3".to_string()),
    };
    assert!(err.to_string().starts_with("cannot encode literal #3 as [u8; 2]: "));
    assert_eq!(
        LayoutError::DuplicateId(LiteralId(1)).to_string(),
        "literal #1 appears more than once"
    );
}
