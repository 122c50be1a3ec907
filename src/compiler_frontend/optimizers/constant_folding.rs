//! # Constant Folding
//!
//! Operators in possum only ever apply to literals, so every operator tree can be evaluated
//! at compile time. This pass walks a typed expression and replaces each operator tree with the
//! literal it evaluates to. Casts applied to literals are folded as well.
//!
//! ## Semantics
//!
//! - **Integers**: evaluated in `i128`, then wrapped to the operand's width (two's complement),
//!   the same way WASM integer arithmetic wraps
//! - **Floats**: evaluated in `f64`, `f32` results are rounded back through `f32`
//! - **Bools**: bitwise operators treat them as `i32` 0 or 1
//! - **Division by zero**: always a compile time error, there is no runtime path for it
//!
//! Folding is deterministic. The same tree always produces the same literal.

use crate::compiler_frontend::ast::ast_nodes::{BinaryOp, TextLocation, UnaryOp};
use crate::compiler_frontend::casts::CastKind;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind};
use crate::compiler_frontend::datatypes::{PrimitiveKind, Type};
use crate::compiler_frontend::hir::hir_nodes::{
    CallArgument, CanonicalCall, Expression, ExpressionKind, HirMatch,
};
use crate::{eval_log, return_rule_error, return_type_error};

/// Fold every literal operator tree and literal cast inside an expression.
pub fn fold(expression: Expression) -> Result<Expression, CompilerError> {
    let Expression {
        kind,
        data_type,
        location,
    } = expression;

    let kind = match kind {
        ExpressionKind::Unary { op, operand } => {
            let operand = fold(*operand)?;
            return evaluate_unary(op, operand, data_type, location);
        }

        ExpressionKind::Binary { op, lhs, rhs } => {
            let lhs = fold(*lhs)?;
            let rhs = fold(*rhs)?;
            return evaluate_operator(op, lhs, rhs, data_type, location);
        }

        ExpressionKind::Cast { value, origin } => {
            let value = fold(*value)?;
            match fold_literal_cast(&value, &data_type) {
                Some(literal) => literal,
                None => ExpressionKind::Cast {
                    value: Box::new(value),
                    origin,
                },
            }
        }

        ExpressionKind::Tuple(elements) => ExpressionKind::Tuple(fold_all(elements)?),
        ExpressionKind::Array(elements) => ExpressionKind::Array(fold_all(elements)?),

        ExpressionKind::Call(call) => {
            let mut args = Vec::with_capacity(call.args.len());
            for arg in call.args {
                args.push(fold_argument(arg)?);
            }

            ExpressionKind::Call(CanonicalCall {
                target: call.target,
                args,
                return_type: call.return_type,
            })
        }

        ExpressionKind::Reference(value) => ExpressionKind::Reference(Box::new(fold(*value)?)),
        ExpressionKind::Dereference(value) => {
            ExpressionKind::Dereference(Box::new(fold(*value)?))
        }

        ExpressionKind::Block {
            expressions,
            has_value,
        } => ExpressionKind::Block {
            expressions: fold_all(expressions)?,
            has_value,
        },

        ExpressionKind::Match(hir_match) => {
            let HirMatch {
                scrutinee,
                decision,
                arms,
            } = *hir_match;

            ExpressionKind::Match(Box::new(HirMatch {
                scrutinee: fold(scrutinee)?,
                decision,
                arms: fold_all(arms)?,
            }))
        }

        literal_or_local => literal_or_local,
    };

    Ok(Expression::new(kind, data_type, location))
}

fn fold_all(expressions: Vec<Expression>) -> Result<Vec<Expression>, CompilerError> {
    expressions.into_iter().map(fold).collect()
}

fn fold_argument(arg: CallArgument) -> Result<CallArgument, CompilerError> {
    let value = fold(arg.value)?;

    if arg.cast == CastKind::Implicit {
        if let Some(literal) = fold_literal_cast(&value, &arg.param_type) {
            return Ok(CallArgument {
                value: Expression::new(literal, arg.param_type.to_owned(), value.location),
                cast: CastKind::Identity,
                param_type: arg.param_type,
            });
        }
    }

    Ok(CallArgument {
        value,
        cast: arg.cast,
        param_type: arg.param_type,
    })
}

/// Converts a literal to another primitive type the way the generated code would at runtime.
/// Returns None when the value isn't a literal or the target isn't a primitive.
pub fn fold_literal_cast(value: &Expression, to: &Type) -> Option<ExpressionKind> {
    let to_kind = to.as_primitive()?;

    let folded = match (&value.kind, to_kind) {
        (ExpressionKind::Int(int), PrimitiveKind::Bool) => ExpressionKind::Bool(*int != 0),
        (ExpressionKind::Int(int), kind) if kind.is_integer() => {
            ExpressionKind::Int(kind.wrap(*int))
        }
        (ExpressionKind::Float(float), PrimitiveKind::F64) => ExpressionKind::Float(*float),
        (ExpressionKind::Float(float), PrimitiveKind::F32) => {
            ExpressionKind::Float(*float as f32 as f64)
        }
        (ExpressionKind::Bool(boolean), PrimitiveKind::Bool) => ExpressionKind::Bool(*boolean),
        _ => return None,
    };

    Some(folded)
}

fn evaluate_unary(
    op: UnaryOp,
    operand: Expression,
    data_type: Type,
    location: TextLocation,
) -> Result<Expression, CompilerError> {
    let kind = match (op, &operand.kind, operand.data_type.as_primitive()) {
        (UnaryOp::Neg, ExpressionKind::Int(value), Some(kind)) => {
            ExpressionKind::Int(kind.wrap(-*value))
        }
        (UnaryOp::BitNot, ExpressionKind::Int(value), Some(kind)) => {
            ExpressionKind::Int(kind.wrap(!*value))
        }
        (UnaryOp::Neg, ExpressionKind::Float(value), Some(kind)) => {
            ExpressionKind::Float(round_float(-*value, kind))
        }
        (UnaryOp::BitNot, ExpressionKind::Bool(value), _) => ExpressionKind::Bool(!*value),

        (_, kind, _) if !is_literal_kind(kind) => {
            return_rule_error!(
                ErrorKind::NonConstantOperand,
                "Operators can only be applied to literals",
                location
            )
        }

        _ => {
            return_type_error!(
                ErrorKind::InvalidOperator {
                    operator: unary_symbol(op).to_owned(),
                    operand: operand.data_type.to_owned(),
                },
                format!(
                    "Can't use the '{}' operator on {}",
                    unary_symbol(op),
                    operand.data_type
                ),
                location
            )
        }
    };

    let result = Expression::new(kind, data_type, location);
    eval_log!("Folded unary to ", Green result.to_string());
    Ok(result)
}

fn evaluate_operator(
    op: BinaryOp,
    lhs: Expression,
    rhs: Expression,
    data_type: Type,
    location: TextLocation,
) -> Result<Expression, CompilerError> {
    if !lhs.is_literal() || !rhs.is_literal() {
        return_rule_error!(
            ErrorKind::NonConstantOperand,
            format!("The '{}' operator can only be applied to literals", op.symbol()),
            location
        )
    }

    let operand_kind = lhs.data_type.as_primitive();

    let kind = match (&lhs.kind, &rhs.kind, operand_kind) {
        (ExpressionKind::Int(a), ExpressionKind::Int(b), Some(kind)) => {
            evaluate_integer(op, *a, *b, kind, &location)?
        }

        (ExpressionKind::Float(a), ExpressionKind::Float(b), Some(kind)) => {
            evaluate_float(op, *a, *b, kind, &lhs.data_type, &location)?
        }

        // Bools are i32 zero or one for bitwise purposes
        (ExpressionKind::Bool(a), ExpressionKind::Bool(b), _) => {
            let (a, b) = (*a as i32, *b as i32);
            match op {
                BinaryOp::BitOr => ExpressionKind::Bool((a | b) & 1 != 0),
                BinaryOp::BitAnd => ExpressionKind::Bool((a & b) & 1 != 0),
                BinaryOp::BitXor => ExpressionKind::Bool((a ^ b) & 1 != 0),
                comparison if comparison.is_comparison() => {
                    ExpressionKind::Bool(compare(comparison, a.cmp(&b)))
                }
                _ => return Err(invalid_operator(op, &lhs.data_type, &location)),
            }
        }

        _ => {
            return_type_error!(
                ErrorKind::TypeMismatch {
                    expected: lhs.data_type.to_owned(),
                    found: rhs.data_type.to_owned(),
                },
                format!(
                    "Both sides of '{}' must have the same type, found {} and {}",
                    op.symbol(),
                    lhs.data_type,
                    rhs.data_type
                ),
                location,
                {
                    ExpectedType => lhs.data_type,
                    FoundType => rhs.data_type,
                }
            )
        }
    };

    let result = Expression::new(kind, data_type, location);
    eval_log!("Folded ", op.symbol(), " to ", Green result.to_string());
    Ok(result)
}

fn evaluate_integer(
    op: BinaryOp,
    a: i128,
    b: i128,
    kind: PrimitiveKind,
    location: &TextLocation,
) -> Result<ExpressionKind, CompilerError> {
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Subtract => a.wrapping_sub(b),
        BinaryOp::Multiply => a.wrapping_mul(b),
        BinaryOp::Divide | BinaryOp::Modulus => {
            if b == 0 {
                return_rule_error!(
                    ErrorKind::DivisionByZero,
                    format!("Can't {} by zero", division_verb(op)),
                    location,
                    {
                        CompilationStage => "Constant Folding",
                        PrimarySuggestion => "Division by a literal zero is always an error",
                    }
                )
            }

            if op == BinaryOp::Divide {
                a.wrapping_div(b)
            } else {
                a.wrapping_rem(b)
            }
        }
        BinaryOp::BitOr => a | b,
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitXor => a ^ b,
        comparison => return Ok(ExpressionKind::Bool(compare(comparison, a.cmp(&b)))),
    };

    Ok(ExpressionKind::Int(kind.wrap(value)))
}

fn evaluate_float(
    op: BinaryOp,
    a: f64,
    b: f64,
    kind: PrimitiveKind,
    data_type: &Type,
    location: &TextLocation,
) -> Result<ExpressionKind, CompilerError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide | BinaryOp::Modulus => {
            if b == 0.0 {
                return_rule_error!(
                    ErrorKind::DivisionByZero,
                    format!("Can't {} by zero", division_verb(op)),
                    location,
                    {
                        CompilationStage => "Constant Folding",
                    }
                )
            }

            if op == BinaryOp::Divide { a / b } else { a % b }
        }
        comparison if comparison.is_comparison() => {
            let ordering = a.partial_cmp(&b);
            let result = match ordering {
                Some(ordering) => compare(comparison, ordering),

                // NaN is unordered, only != holds
                None => comparison == BinaryOp::NotEqual,
            };
            return Ok(ExpressionKind::Bool(result));
        }
        _ => return Err(invalid_operator(op, data_type, location)),
    };

    Ok(ExpressionKind::Float(round_float(value, kind)))
}

fn compare(op: BinaryOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering;
    match op {
        BinaryOp::Equal => ordering == Ordering::Equal,
        BinaryOp::NotEqual => ordering != Ordering::Equal,
        BinaryOp::LessThan => ordering == Ordering::Less,
        BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
        BinaryOp::GreaterThan => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }
}

fn round_float(value: f64, kind: PrimitiveKind) -> f64 {
    if kind == PrimitiveKind::F32 {
        value as f32 as f64
    } else {
        value
    }
}

fn is_literal_kind(kind: &ExpressionKind) -> bool {
    matches!(
        kind,
        ExpressionKind::Int(_) | ExpressionKind::Float(_) | ExpressionKind::Bool(_)
    )
}

fn division_verb(op: BinaryOp) -> &'static str {
    if op == BinaryOp::Divide {
        "divide"
    } else {
        "take the remainder"
    }
}

pub fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "-",
        UnaryOp::BitNot => "~",
    }
}

fn invalid_operator(op: BinaryOp, operand: &Type, location: &TextLocation) -> CompilerError {
    CompilerError::new(
        ErrorKind::InvalidOperator {
            operator: op.symbol().to_owned(),
            operand: operand.to_owned(),
        },
        format!("Can't use the '{}' operator on {operand}", op.symbol()),
        location.to_owned(),
    )
}

#[cfg(test)]
#[path = "tests/constant_folding_tests.rs"]
mod tests;
