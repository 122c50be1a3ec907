use super::*;
use crate::compiler_frontend::ast::ast_nodes::Expr;
use crate::compiler_frontend::hir::hir_expression::lower_literal_tree;
use crate::compiler_frontend::test_support::{
    binary, boolean, float, float_as, int, int_as, loc, unary,
};

fn evaluate(expr: &Expr, hint: Option<PrimitiveKind>) -> Result<Expression, CompilerError> {
    fold(lower_literal_tree(expr, hint)?)
}

fn folded_kind(expr: &Expr, hint: Option<PrimitiveKind>) -> ExpressionKind {
    evaluate(expr, hint).expect("tree should fold").kind
}

#[test]
fn unsuffixed_integer_trees_default_to_s32() {
    let expr = binary(BinaryOp::Add, int(2), binary(BinaryOp::Multiply, int(3), int(4)));
    let folded = evaluate(&expr, None).expect("tree should fold");

    assert_eq!(folded.kind, ExpressionKind::Int(14));
    assert_eq!(folded.data_type, Type::Primitive(PrimitiveKind::S32));
}

#[test]
fn a_suffix_anywhere_types_the_whole_tree() {
    let expr = binary(BinaryOp::Add, int(250), int_as(10, PrimitiveKind::U8));
    let folded = evaluate(&expr, Some(PrimitiveKind::U64)).expect("tree should fold");

    // 250 + 10 wraps at eight bits
    assert_eq!(folded.kind, ExpressionKind::Int(4));
    assert_eq!(folded.data_type, Type::Primitive(PrimitiveKind::U8));
}

#[test]
fn hints_type_unsuffixed_trees() {
    let expr = binary(BinaryOp::Subtract, int(0), int(1));
    let folded = evaluate(&expr, Some(PrimitiveKind::U16)).expect("tree should fold");

    assert_eq!(folded.kind, ExpressionKind::Int(u16::MAX as i128));
    assert_eq!(folded.data_type, Type::Primitive(PrimitiveKind::U16));
}

#[test]
fn signed_wrapping_and_negation() {
    let overflow = binary(BinaryOp::Add, int_as(127, PrimitiveKind::S8), int(1));
    assert_eq!(folded_kind(&overflow, None), ExpressionKind::Int(-128));

    let negated = unary(UnaryOp::Neg, int_as(128, PrimitiveKind::S8));
    assert_eq!(folded_kind(&negated, None), ExpressionKind::Int(-128));

    let not = unary(UnaryOp::BitNot, int_as(0, PrimitiveKind::U8));
    assert_eq!(folded_kind(&not, None), ExpressionKind::Int(255));
}

#[test]
fn integer_division_truncates_toward_zero() {
    let div = binary(BinaryOp::Divide, unary(UnaryOp::Neg, int(7)), int(2));
    assert_eq!(folded_kind(&div, None), ExpressionKind::Int(-3));

    let rem = binary(BinaryOp::Modulus, unary(UnaryOp::Neg, int(7)), int(2));
    assert_eq!(folded_kind(&rem, None), ExpressionKind::Int(-1));
}

#[test]
fn division_by_zero_is_a_compile_time_error() {
    for op in [BinaryOp::Divide, BinaryOp::Modulus] {
        let error = evaluate(&binary(op, int(1), int(0)), None).expect_err("zero divisor");
        assert_eq!(error.kind, ErrorKind::DivisionByZero);
    }

    let error = evaluate(&binary(BinaryOp::Divide, float(1.0), float(0.0)), None)
        .expect_err("float zero divisor");
    assert_eq!(error.kind, ErrorKind::DivisionByZero);
}

#[test]
fn float_trees_round_through_f32() {
    let expr = binary(BinaryOp::Add, float_as(0.1, PrimitiveKind::F32), float(0.2));
    let folded = evaluate(&expr, None).expect("tree should fold");

    let expected = (0.1f32 as f64 + 0.2f32 as f64) as f32 as f64;
    assert_eq!(folded.kind, ExpressionKind::Float(expected));
    assert_eq!(folded.data_type, Type::Primitive(PrimitiveKind::F32));
}

#[test]
fn integers_inside_float_trees_become_floats() {
    let expr = binary(BinaryOp::Multiply, float(1.5), int(2));
    assert_eq!(folded_kind(&expr, None), ExpressionKind::Float(3.0));
}

#[test]
fn comparisons_produce_bools() {
    let less = binary(BinaryOp::LessThan, unary(UnaryOp::Neg, int(1)), int(1));
    let folded = evaluate(&less, None).expect("tree should fold");
    assert_eq!(folded.kind, ExpressionKind::Bool(true));
    assert_eq!(folded.data_type, Type::Primitive(PrimitiveKind::Bool));

    // Unsigned operands compare as unsigned
    let unsigned = binary(
        BinaryOp::GreaterThan,
        int_as(255, PrimitiveKind::U8),
        int(1),
    );
    assert_eq!(folded_kind(&unsigned, None), ExpressionKind::Bool(true));

    let nan = binary(BinaryOp::NotEqual, float(f64::NAN), float(f64::NAN));
    assert_eq!(folded_kind(&nan, None), ExpressionKind::Bool(true));
}

#[test]
fn bools_use_bitwise_operators() {
    let expr = binary(BinaryOp::BitXor, boolean(true), binary(BinaryOp::BitAnd, boolean(true), boolean(false)));
    assert_eq!(folded_kind(&expr, None), ExpressionKind::Bool(true));

    let error = evaluate(&binary(BinaryOp::Add, boolean(true), boolean(true)), None)
        .expect_err("bools have no arithmetic");
    assert!(matches!(error.kind, ErrorKind::InvalidOperator { .. }));
}

#[test]
fn floats_have_no_bitwise_operators() {
    let error = evaluate(&binary(BinaryOp::BitOr, float(1.0), float(2.0)), None)
        .expect_err("floats have no bitwise operators");
    assert!(matches!(error.kind, ErrorKind::InvalidOperator { .. }));
}

#[test]
fn literal_casts_fold_to_the_target_kind() {
    let value = Expression::new(
        ExpressionKind::Int(300),
        Type::Primitive(PrimitiveKind::U16),
        loc(),
    );

    assert_eq!(
        fold_literal_cast(&value, &Type::Primitive(PrimitiveKind::U64)),
        Some(ExpressionKind::Int(300))
    );
    assert_eq!(
        fold_literal_cast(&value, &Type::Primitive(PrimitiveKind::Bool)),
        Some(ExpressionKind::Bool(true))
    );
    assert_eq!(
        fold_literal_cast(&value, &Type::reference_to(Type::Primitive(PrimitiveKind::U16))),
        None
    );
}

#[test]
fn nested_casts_fold_inside_calls_and_blocks() {
    let literal = Expression::new(
        ExpressionKind::Int(3),
        Type::Primitive(PrimitiveKind::U8),
        loc(),
    );
    let cast = Expression::new(
        ExpressionKind::Cast {
            value: Box::new(literal),
            origin: crate::compiler_frontend::hir::hir_nodes::CastOrigin::Implicit,
        },
        Type::Primitive(PrimitiveKind::U32),
        loc(),
    );
    let block = Expression::new(
        ExpressionKind::Block {
            expressions: vec![cast],
            has_value: true,
        },
        Type::Primitive(PrimitiveKind::U32),
        loc(),
    );

    let folded = fold(block).expect("block should fold");
    let ExpressionKind::Block { expressions, .. } = folded.kind else {
        panic!("expected a block");
    };
    assert_eq!(expressions[0].kind, ExpressionKind::Int(3));
    assert_eq!(expressions[0].data_type, Type::Primitive(PrimitiveKind::U32));
}
