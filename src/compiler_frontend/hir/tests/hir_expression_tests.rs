use super::*;
use crate::compiler_frontend::test_support::{
    arm, array, array_ty, block, bool_pattern, cast, expr, ident, int, int_as, int_pattern,
    lower_named, match_expr, module, param, ty, function, binary,
};

fn u8_type() -> Type {
    Type::Primitive(PrimitiveKind::U8)
}

fn lowered_body(decl: crate::compiler_frontend::ast::ast_nodes::FunctionDecl) -> Expression {
    let name = decl.name.to_owned();
    lower_named(&module(Vec::new(), vec![decl]), &name)
        .expect("function should check")
        .function
        .body
}

fn lowering_error(decl: crate::compiler_frontend::ast::ast_nodes::FunctionDecl) -> ErrorKind {
    let name = decl.name.to_owned();
    lower_named(&module(Vec::new(), vec![decl]), &name)
        .expect_err("function should be rejected")
        .kind
}

#[test]
fn literals_take_the_expected_type() {
    let body = lowered_body(function("f", Vec::new(), Some(ty("u8")), int(200)));

    assert_eq!(body.kind, ExpressionKind::Int(200));
    assert_eq!(body.data_type, u8_type());
}

#[test]
fn literals_must_fit_their_kind() {
    let kind = lowering_error(function("f", Vec::new(), Some(ty("u8")), int(300)));
    assert_eq!(
        kind,
        ErrorKind::LiteralOutOfRange {
            literal: String::from("300"),
            kind: u8_type(),
        }
    );

    // The suffix decides the kind even when the return type is wider
    let kind = lowering_error(function(
        "g",
        Vec::new(),
        Some(ty("u64")),
        int_as(256, PrimitiveKind::U8),
    ));
    assert!(matches!(kind, ErrorKind::LiteralOutOfRange { .. }));
}

#[test]
fn a_suffix_anywhere_in_the_tree_beats_the_hint() {
    let body = lowered_body(function(
        "f",
        Vec::new(),
        Some(ty("u64")),
        binary(BinaryOp::Add, int(1), int_as(2, PrimitiveKind::U8)),
    ));

    assert_eq!(body.data_type, Type::Primitive(PrimitiveKind::U64));
    let ExpressionKind::Cast { value, origin } = &body.kind else {
        panic!("expected an implicit widening, got {body}");
    };
    assert_eq!(*origin, CastOrigin::Implicit);
    assert_eq!(value.data_type, u8_type());
}

#[test]
fn operators_only_apply_to_literals() {
    let kind = lowering_error(function(
        "f",
        vec![param("a", ty("u8"))],
        Some(ty("u8")),
        binary(BinaryOp::Add, ident("a"), int(1)),
    ));

    assert_eq!(kind, ErrorKind::NonConstantOperand);
}

#[test]
fn byte_strings_are_u8_arrays() {
    let body = lowered_body(function(
        "f",
        Vec::new(),
        Some(array_ty(ty("u8"), int(2))),
        expr(ExprKind::Literal(Literal::ByteString(b"hi".to_vec()))),
    ));

    assert_eq!(
        body.data_type,
        Type::Array {
            element: Box::new(u8_type()),
            length: 2,
        }
    );
    let ExpressionKind::Array(elements) = body.kind else {
        panic!("expected an array");
    };
    assert_eq!(elements[0].kind, ExpressionKind::Int(b'h' as i128));
}

#[test]
fn chars_and_strings_have_no_type() {
    for literal in [Literal::Char('x'), Literal::String(String::from("hello"))] {
        let kind = lowering_error(function(
            "f",
            Vec::new(),
            None,
            expr(ExprKind::Literal(literal)),
        ));
        assert!(matches!(kind, ErrorKind::UnsupportedLiteral { .. }));
    }
}

#[test]
fn explicit_casts_allow_explicit_only_conversions() {
    let body = lowered_body(function(
        "f",
        vec![param("a", ty("u8"))],
        Some(ty("s16")),
        cast(ident("a"), ty("s16")),
    ));

    assert_eq!(body.data_type, Type::Primitive(PrimitiveKind::S16));
    assert!(matches!(
        body.kind,
        ExpressionKind::Cast {
            origin: CastOrigin::Explicit,
            ..
        }
    ));

    let kind = lowering_error(function(
        "narrow",
        vec![param("a", ty("u64"))],
        Some(ty("u8")),
        cast(ident("a"), ty("u8")),
    ));
    assert!(matches!(kind, ErrorKind::IllegalCast { .. }));
}

#[test]
fn return_position_inserts_implicit_casts() {
    let body = lowered_body(function(
        "f",
        vec![param("a", ty("u8"))],
        Some(ty("u64")),
        ident("a"),
    ));

    assert_eq!(body.data_type, Type::Primitive(PrimitiveKind::U64));
    assert!(matches!(
        body.kind,
        ExpressionKind::Cast {
            origin: CastOrigin::Implicit,
            ..
        }
    ));
}

#[test]
fn return_position_rejects_casts_that_need_as() {
    let kind = lowering_error(function(
        "f",
        vec![param("a", ty("u8"))],
        Some(ty("s16")),
        ident("a"),
    ));
    assert!(matches!(kind, ErrorKind::ImplicitCastNotAllowed { .. }));

    let kind = lowering_error(function(
        "g",
        vec![param("a", ty("bool"))],
        Some(ty("u64")),
        ident("a"),
    ));
    assert!(matches!(kind, ErrorKind::ReturnTypeMismatch { .. }));
}

#[test]
fn match_arms_are_cast_to_the_expected_type() {
    let body = lowered_body(function(
        "f",
        vec![param("n", ty("u8")), param("m", ty("u16"))],
        Some(ty("u16")),
        match_expr(
            ident("n"),
            vec![
                arm(vec![int_pattern(0)], ident("n")),
                arm(vec![Pattern::Wildcard], ident("m")),
            ],
        ),
    ));

    let ExpressionKind::Match(lowered) = body.kind else {
        panic!("expected a match");
    };
    assert_eq!(lowered.arms[0].data_type, Type::Primitive(PrimitiveKind::U16));
    assert!(matches!(lowered.arms[0].kind, ExpressionKind::Cast { .. }));
    assert_eq!(lowered.arms[1].kind, ExpressionKind::Local(LocalId(1)));
}

#[test]
fn match_arms_without_an_expected_type_follow_the_first_arm() {
    // The match is sequenced away, so nothing types it from outside
    let kind = lowering_error(function(
        "f",
        vec![param("flag", ty("bool")), param("n", ty("u8")), param("m", ty("s16"))],
        None,
        block(
            vec![match_expr(
                ident("flag"),
                vec![
                    arm(vec![bool_pattern(true)], ident("n")),
                    arm(vec![bool_pattern(false)], ident("m")),
                ],
            )],
            true,
        ),
    ));

    assert!(matches!(kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn patterns_must_match_the_scrutinee_type() {
    let kind = lowering_error(function(
        "f",
        vec![param("flag", ty("bool"))],
        Some(ty("u8")),
        match_expr(
            ident("flag"),
            vec![
                arm(vec![int_pattern(0)], int(0)),
                arm(vec![Pattern::Wildcard], int(1)),
            ],
        ),
    ));

    assert!(matches!(kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn empty_arrays_need_an_element_type() {
    let kind = lowering_error(function(
        "f",
        Vec::new(),
        None,
        block(vec![array(Vec::new())], true),
    ));
    assert_eq!(kind, ErrorKind::CannotInferType);

    let body = lowered_body(function(
        "g",
        Vec::new(),
        Some(array_ty(ty("u8"), int(0))),
        array(Vec::new()),
    ));
    assert_eq!(
        body.data_type,
        Type::Array {
            element: Box::new(u8_type()),
            length: 0,
        }
    );
}

#[test]
fn identifiers_must_be_parameters() {
    let kind = lowering_error(function("f", Vec::new(), Some(ty("u8")), ident("x")));
    assert_eq!(
        kind,
        ErrorKind::UnknownIdentifier {
            name: String::from("x")
        }
    );
}
