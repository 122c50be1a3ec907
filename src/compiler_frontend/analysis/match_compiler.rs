//! Pattern match compilation.
//!
//! Arms are tried top to bottom. Each arm becomes one test: a list of conditions joined by OR,
//! or an unconditional match for a wildcard. Runs of three or more contiguous integers inside
//! an arm collapse into a single range condition.
//!
//! The same walk proves exhaustiveness and finds arms earlier arms already cover.
//! Floats are never exhaustive without a wildcard, bools and integers are when every value of
//! the domain has been listed.

use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind};
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::datatypes::{PrimitiveKind, Type};
use crate::{match_log, return_rule_error};
use std::fmt;

// Shortest run of contiguous values that becomes a range test
const MIN_RANGE_RUN: usize = 3;

/// A literal pattern after it has been typed against the scrutinee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternValue {
    Int(i128),
    Bool(bool),
    Float(f64),
}

impl fmt::Display for PatternValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternValue::Int(value) => write!(f, "{value}"),
            PatternValue::Bool(value) => write!(f, "{value}"),
            PatternValue::Float(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckedPattern {
    Wildcard,
    Value(PatternValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckedArm {
    // Alternatives joined by |
    pub patterns: Vec<CheckedPattern>,
    pub location: TextLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Always,
    Equals(PatternValue),

    // Inclusive on both ends
    Range { start: i128, end: i128 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArmTest {
    pub arm: usize,

    // The arm matches when any condition holds
    pub conditions: Vec<Condition>,
}

impl ArmTest {
    pub fn is_unconditional(&self) -> bool {
        self.conditions.contains(&Condition::Always)
    }
}

/// Linear decision procedure. Tests run in order and the first one that holds picks its arm.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    pub tests: Vec<ArmTest>,

    // Every value is listed by some arm and no arm is a wildcard,
    // so falling through every test can't happen
    pub exhaustive_by_enumeration: bool,
}

pub fn compile(
    scrutinee: &Type,
    arms: &[CheckedArm],
    location: &TextLocation,
) -> Result<(DecisionTree, Vec<CompilerWarning>), CompilerError> {
    let domain = Domain::of(scrutinee);
    let mut seen: Vec<PatternValue> = Vec::new();
    let mut covered = false;
    let mut has_wildcard_arm = false;
    let mut tests = Vec::with_capacity(arms.len());
    let mut warnings = Vec::new();

    for (index, arm) in arms.iter().enumerate() {
        if covered {
            return_rule_error!(
                ErrorKind::UnreachableArm { index },
                format!("Match arm {index} can never be reached, earlier arms already cover every value"),
                arm.location,
                {
                    PrimarySuggestion => "Remove this arm or move it above the arm that covers it",
                }
            )
        }

        let arm_has_wildcard = arm.patterns.contains(&CheckedPattern::Wildcard);
        let mut new_values: Vec<PatternValue> = Vec::new();
        let mut redundant: Vec<PatternValue> = Vec::new();

        for pattern in &arm.patterns {
            if let CheckedPattern::Value(value) = pattern {
                if seen.contains(value) || new_values.contains(value) {
                    redundant.push(*value);
                } else {
                    new_values.push(*value);
                }
            }
        }

        if !arm_has_wildcard && new_values.is_empty() {
            return_rule_error!(
                ErrorKind::UnreachableArm { index },
                format!(
                    "Match arm {index} can never be reached, every pattern in it was matched by an earlier arm"
                ),
                arm.location
            )
        }

        for value in &redundant {
            warnings.push(CompilerWarning::new(
                &format!("'{value}' in match arm {index} is already matched"),
                arm.location.to_owned(),
                WarningKind::RedundantPattern,
            ));
        }

        let conditions = if arm_has_wildcard {
            has_wildcard_arm = true;
            covered = true;
            vec![Condition::Always]
        } else {
            seen.extend_from_slice(&new_values);
            covered = domain.is_covered_by(&seen);
            conditions_for(new_values)
        };

        match_log!("Arm ", index, " lowered to ", Blue {format!("{conditions:?}")});
        tests.push(ArmTest {
            arm: index,
            conditions,
        });
    }

    if !covered {
        let missing_representative = domain.missing_representative(&seen);
        return_rule_error!(
            ErrorKind::NonExhaustiveMatch {
                missing_representative: missing_representative.to_owned(),
            },
            format!(
                "`match` is not exhaustive, '{missing_representative}' is not covered by any arm"
            ),
            location,
            {
                PrimarySuggestion => "Add an arm for the missing value or a trailing `_` arm",
            }
        )
    }

    Ok((
        DecisionTree {
            tests,
            exhaustive_by_enumeration: !has_wildcard_arm,
        },
        warnings,
    ))
}

fn conditions_for(mut values: Vec<PatternValue>) -> Vec<Condition> {
    let mut integers: Vec<i128> = values
        .iter()
        .filter_map(|value| match value {
            PatternValue::Int(int) => Some(*int),
            _ => None,
        })
        .collect();

    // Bools and floats stay as equality tests in source order
    values.retain(|value| !matches!(value, PatternValue::Int(_)));
    let mut conditions: Vec<Condition> = values.into_iter().map(Condition::Equals).collect();

    integers.sort_unstable();
    let mut run_start = 0;
    for index in 1..=integers.len() {
        let run_continues = index < integers.len() && integers[index] == integers[index - 1] + 1;
        if run_continues {
            continue;
        }

        let run = &integers[run_start..index];
        if run.len() >= MIN_RANGE_RUN {
            conditions.push(Condition::Range {
                start: run[0],
                end: run[run.len() - 1],
            });
        } else {
            conditions.extend(run.iter().map(|int| Condition::Equals(PatternValue::Int(*int))));
        }
        run_start = index;
    }

    conditions
}

enum Domain {
    Bool,
    Integer(PrimitiveKind),

    // Floats and compound types can only be covered by a wildcard
    Open,
}

impl Domain {
    fn of(scrutinee: &Type) -> Domain {
        match scrutinee.as_primitive() {
            Some(PrimitiveKind::Bool) => Domain::Bool,
            Some(kind) if kind.is_integer() => Domain::Integer(kind),
            _ => Domain::Open,
        }
    }

    fn is_covered_by(&self, seen: &[PatternValue]) -> bool {
        match self {
            Domain::Bool => {
                seen.contains(&PatternValue::Bool(true))
                    && seen.contains(&PatternValue::Bool(false))
            }
            Domain::Integer(kind) => seen.len() as u128 >= 1u128 << kind.bit_width(),
            Domain::Open => false,
        }
    }

    fn missing_representative(&self, seen: &[PatternValue]) -> String {
        match self {
            Domain::Bool => {
                if seen.contains(&PatternValue::Bool(true)) {
                    String::from("false")
                } else {
                    String::from("true")
                }
            }
            Domain::Integer(kind) => {
                let Some((min, max)) = kind.integer_range() else {
                    return String::from("_");
                };

                // Prefer the smallest missing non-negative value, it's what people expect to read
                let is_missing = |value: i128| !seen.contains(&PatternValue::Int(value));
                let candidate = (0..=max)
                    .find(|value| is_missing(*value))
                    .or_else(|| (min..0).rev().find(|value| is_missing(*value)));

                match candidate {
                    Some(value) => value.to_string(),
                    None => String::from("_"),
                }
            }
            Domain::Open => String::from("_"),
        }
    }
}

#[cfg(test)]
#[path = "tests/match_compiler_tests.rs"]
mod tests;
