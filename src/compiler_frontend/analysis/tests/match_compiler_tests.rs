use super::*;
use crate::compiler_frontend::test_support::loc;

fn int_arm(values: &[i128]) -> CheckedArm {
    CheckedArm {
        patterns: values
            .iter()
            .map(|value| CheckedPattern::Value(PatternValue::Int(*value)))
            .collect(),
        location: loc(),
    }
}

fn bool_arm(value: bool) -> CheckedArm {
    CheckedArm {
        patterns: vec![CheckedPattern::Value(PatternValue::Bool(value))],
        location: loc(),
    }
}

fn wildcard_arm() -> CheckedArm {
    CheckedArm {
        patterns: vec![CheckedPattern::Wildcard],
        location: loc(),
    }
}

fn prim(kind: PrimitiveKind) -> Type {
    Type::Primitive(kind)
}

#[test]
fn bool_match_needs_both_values() {
    let bool_type = prim(PrimitiveKind::Bool);

    let error = compile(&bool_type, &[bool_arm(false)], &loc()).expect_err("true is missing");
    assert_eq!(
        error.kind,
        ErrorKind::NonExhaustiveMatch {
            missing_representative: String::from("true")
        }
    );

    let (tree, warnings) = compile(&bool_type, &[bool_arm(false), bool_arm(true)], &loc())
        .expect("both values are listed");
    assert!(tree.exhaustive_by_enumeration);
    assert!(warnings.is_empty());

    let (tree, _) = compile(&bool_type, &[bool_arm(false), wildcard_arm()], &loc())
        .expect("the wildcard covers true");
    assert!(!tree.exhaustive_by_enumeration);
    assert!(tree.tests[1].is_unconditional());
}

#[test]
fn arms_after_a_wildcard_are_unreachable() {
    let error = compile(
        &prim(PrimitiveKind::S32),
        &[wildcard_arm(), int_arm(&[1])],
        &loc(),
    )
    .expect_err("arm 1 follows a wildcard");

    assert_eq!(error.kind, ErrorKind::UnreachableArm { index: 1 });
}

#[test]
fn arms_whose_values_are_all_taken_are_unreachable() {
    let error = compile(
        &prim(PrimitiveKind::U8),
        &[int_arm(&[1, 2]), int_arm(&[2, 1]), wildcard_arm()],
        &loc(),
    )
    .expect_err("arm 1 adds nothing");

    assert_eq!(error.kind, ErrorKind::UnreachableArm { index: 1 });
}

#[test]
fn partially_redundant_arms_warn() {
    let (tree, warnings) = compile(
        &prim(PrimitiveKind::U8),
        &[int_arm(&[1]), int_arm(&[1, 2]), wildcard_arm()],
        &loc(),
    )
    .expect("arm 1 still matches 2");

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].warning_kind, WarningKind::RedundantPattern);
    assert_eq!(
        tree.tests[1].conditions,
        vec![Condition::Equals(PatternValue::Int(2))]
    );
}

#[test]
fn contiguous_runs_become_ranges() {
    let (tree, _) = compile(
        &prim(PrimitiveKind::S32),
        &[int_arm(&[5, 3, 4, 10, 11, 2]), wildcard_arm()],
        &loc(),
    )
    .expect("match is covered by the wildcard");

    assert_eq!(
        tree.tests[0].conditions,
        vec![
            Condition::Range { start: 2, end: 5 },
            Condition::Equals(PatternValue::Int(10)),
            Condition::Equals(PatternValue::Int(11)),
        ]
    );
}

#[test]
fn integer_matches_report_the_smallest_missing_value() {
    let error = compile(&prim(PrimitiveKind::U64), &[int_arm(&[0, 1])], &loc())
        .expect_err("u64 isn't covered by two values");

    assert_eq!(
        error.kind,
        ErrorKind::NonExhaustiveMatch {
            missing_representative: String::from("2")
        }
    );
}

#[test]
fn listing_every_u8_value_is_exhaustive() {
    let all: Vec<i128> = (0..=255).collect();
    let (tree, _) = compile(&prim(PrimitiveKind::U8), &[int_arm(&all)], &loc())
        .expect("every value is listed");

    assert!(tree.exhaustive_by_enumeration);
    assert_eq!(
        tree.tests[0].conditions,
        vec![Condition::Range { start: 0, end: 255 }]
    );
}

#[test]
fn signed_matches_look_at_negative_values_last() {
    let non_negative: Vec<i128> = (0..=127).collect();
    let error = compile(&prim(PrimitiveKind::S8), &[int_arm(&non_negative)], &loc())
        .expect_err("negative values are missing");

    assert_eq!(
        error.kind,
        ErrorKind::NonExhaustiveMatch {
            missing_representative: String::from("-1")
        }
    );
}

#[test]
fn float_matches_always_need_a_wildcard() {
    let float_arm = CheckedArm {
        patterns: vec![CheckedPattern::Value(PatternValue::Float(1.5))],
        location: loc(),
    };

    let error = compile(&prim(PrimitiveKind::F64), &[float_arm.to_owned()], &loc())
        .expect_err("floats are never enumerated");
    assert!(matches!(error.kind, ErrorKind::NonExhaustiveMatch { .. }));

    assert!(compile(&prim(PrimitiveKind::F64), &[float_arm, wildcard_arm()], &loc()).is_ok());
}
