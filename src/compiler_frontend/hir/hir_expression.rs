//! HIR Expression Lowering
//!
//! Lowers syntactic expressions into typed HIR expressions.
//! This file contains the literal typing rules and the expression lowering on `FunctionBuilder`.
//! Calls are handed off to `call_desugaring`.

use crate::compiler_frontend::analysis::match_compiler::{
    self, CheckedArm, CheckedPattern, PatternValue,
};
use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOp, Expr, ExprKind, Literal, MatchArm, Pattern, TextLocation, UnaryOp,
};
use crate::compiler_frontend::casts::{CastKind, cast_kind};
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind, ErrorMetaDataKey};
use crate::compiler_frontend::datatypes::{PrimitiveKind, Type};
use crate::compiler_frontend::hir::hir_builder::FunctionBuilder;
use crate::compiler_frontend::hir::hir_nodes::{
    CastOrigin, Expression, ExpressionKind, HirMatch, LocalId,
};
use crate::compiler_frontend::optimizers::constant_folding::unary_symbol;
use crate::{return_rule_error, return_type_error};

/// Where an implicit cast is being inserted. Only changes which error an illegal cast reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoercionSite {
    Return,
    MatchArm,
    ArrayElement,
}

// ------------------------
// Literal operator trees
// ------------------------

/// True for literals and operator trees made only of literals.
/// Byte strings, chars and strings are not part of any tree.
pub fn is_literal_tree(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(literal) => matches!(
            literal,
            Literal::Integer { .. } | Literal::Float { .. } | Literal::Bool(_) | Literal::Byte(_)
        ),
        ExprKind::Unary { operand, .. } => is_literal_tree(operand),
        ExprKind::Binary { lhs, rhs, .. } => is_literal_tree(lhs) && is_literal_tree(rhs),
        _ => false,
    }
}

/// The first explicit kind inside a tree. Comparisons end the search,
/// their operands are typed on their own.
pub fn find_suffix(expr: &Expr) -> Option<PrimitiveKind> {
    match &expr.kind {
        ExprKind::Literal(Literal::Integer { suffix, .. })
        | ExprKind::Literal(Literal::Float { suffix, .. }) => *suffix,
        ExprKind::Literal(Literal::Byte(_)) => Some(PrimitiveKind::U8),
        ExprKind::Unary { operand, .. } => find_suffix(operand),
        ExprKind::Binary { op, lhs, rhs } if !op.is_comparison() => {
            find_suffix(lhs).or_else(|| find_suffix(rhs))
        }
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LiteralClass {
    Integer,
    Float,
    Bool,
}

fn first_leaf_class(expr: &Expr) -> LiteralClass {
    match &expr.kind {
        ExprKind::Literal(Literal::Float { .. }) => LiteralClass::Float,
        ExprKind::Literal(Literal::Bool(_)) => LiteralClass::Bool,
        ExprKind::Unary { operand, .. } => first_leaf_class(operand),
        ExprKind::Binary { op, .. } if op.is_comparison() => LiteralClass::Bool,
        ExprKind::Binary { lhs, .. } => first_leaf_class(lhs),
        _ => LiteralClass::Integer,
    }
}

// A suffix anywhere in the tree wins, then a hint of the right class, then the default kind
fn tree_kind(expr: &Expr, hint: Option<PrimitiveKind>) -> PrimitiveKind {
    if let Some(suffix) = find_suffix(expr) {
        return suffix;
    }

    match first_leaf_class(expr) {
        LiteralClass::Integer => match hint {
            Some(kind) if kind.is_integer() => kind,
            _ => PrimitiveKind::S32,
        },
        LiteralClass::Float => match hint {
            Some(kind) if kind.is_float() => kind,
            _ => PrimitiveKind::F64,
        },
        LiteralClass::Bool => PrimitiveKind::Bool,
    }
}

/// Types a literal operator tree without folding it.
pub fn lower_literal_tree(
    expr: &Expr,
    hint: Option<PrimitiveKind>,
) -> Result<Expression, CompilerError> {
    let kind = tree_kind(expr, hint);
    lower_tree_node(expr, kind)
}

fn lower_tree_node(expr: &Expr, kind: PrimitiveKind) -> Result<Expression, CompilerError> {
    let location = &expr.location;

    match &expr.kind {
        ExprKind::Literal(literal) => lower_tree_literal(literal, kind, location),

        ExprKind::Unary { op, operand } => {
            let operand = lower_tree_node(operand, kind)?;
            let legal = match (op, operand.data_type.as_primitive()) {
                (UnaryOp::Neg, Some(operand_kind)) => {
                    operand_kind.is_integer() || operand_kind.is_float()
                }
                (UnaryOp::BitNot, Some(operand_kind)) => {
                    operand_kind.is_integer() || operand_kind == PrimitiveKind::Bool
                }
                _ => false,
            };

            if !legal {
                return_type_error!(
                    ErrorKind::InvalidOperator {
                        operator: unary_symbol(*op).to_owned(),
                        operand: operand.data_type.to_owned(),
                    },
                    format!(
                        "Can't use the '{}' operator on {}",
                        unary_symbol(*op),
                        operand.data_type
                    ),
                    location
                )
            }

            let data_type = operand.data_type.to_owned();
            Ok(Expression::new(
                ExpressionKind::Unary {
                    op: *op,
                    operand: Box::new(operand),
                },
                data_type,
                location.to_owned(),
            ))
        }

        ExprKind::Binary { op, lhs, rhs } => {
            let (lhs, rhs) = if op.is_comparison() {
                let operand_kind = find_suffix(lhs)
                    .or_else(|| find_suffix(rhs))
                    .unwrap_or_else(|| tree_kind(lhs, None));
                (
                    lower_tree_node(lhs, operand_kind)?,
                    lower_tree_node(rhs, operand_kind)?,
                )
            } else {
                (lower_tree_node(lhs, kind)?, lower_tree_node(rhs, kind)?)
            };

            check_binary_operands(*op, &lhs, &rhs, location)?;

            let data_type = if op.is_comparison() {
                Type::Primitive(PrimitiveKind::Bool)
            } else {
                lhs.data_type.to_owned()
            };

            Ok(Expression::new(
                ExpressionKind::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                data_type,
                location.to_owned(),
            ))
        }

        _ => {
            return_rule_error!(
                ErrorKind::NonConstantOperand,
                "Operators can only be applied to literals",
                location
            )
        }
    }
}

fn check_binary_operands(
    op: BinaryOp,
    lhs: &Expression,
    rhs: &Expression,
    location: &TextLocation,
) -> Result<(), CompilerError> {
    if lhs.data_type != rhs.data_type {
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

    let Some(kind) = lhs.data_type.as_primitive() else {
        return_type_error!(
            ErrorKind::InvalidOperator {
                operator: op.symbol().to_owned(),
                operand: lhs.data_type.to_owned(),
            },
            format!("Can't use the '{}' operator on {}", op.symbol(), lhs.data_type),
            location
        )
    };

    let legal = if op.is_arithmetic() {
        kind.is_integer() || kind.is_float()
    } else if op.is_bitwise() {
        kind.is_integer() || kind == PrimitiveKind::Bool
    } else {
        true
    };

    if !legal {
        return_type_error!(
            ErrorKind::InvalidOperator {
                operator: op.symbol().to_owned(),
                operand: lhs.data_type.to_owned(),
            },
            format!("Can't use the '{}' operator on {}", op.symbol(), lhs.data_type),
            location,
            {
                FoundType => lhs.data_type,
            }
        )
    }

    Ok(())
}

fn lower_tree_literal(
    literal: &Literal,
    kind: PrimitiveKind,
    location: &TextLocation,
) -> Result<Expression, CompilerError> {
    let (value, data_kind) = match literal {
        Literal::Integer { value, suffix } => {
            let leaf_kind = suffix.unwrap_or(kind);

            if leaf_kind.is_float() {
                // 1f32, or an unsuffixed integer inside a float tree like 1.5 + 1
                let value = *value as f64;
                let value = if leaf_kind == PrimitiveKind::F32 {
                    value as f32 as f64
                } else {
                    value
                };
                (ExpressionKind::Float(value), leaf_kind)
            } else if leaf_kind.is_integer() {
                (
                    ExpressionKind::Int(integer_literal(*value, leaf_kind, location)?),
                    leaf_kind,
                )
            } else {
                return Err(literal_mismatch(leaf_kind, PrimitiveKind::S32, literal, location));
            }
        }

        Literal::Float { value, suffix } => {
            let leaf_kind = match suffix {
                Some(suffix) => *suffix,
                None if kind.is_float() => kind,
                None => PrimitiveKind::F64,
            };

            if !leaf_kind.is_float() {
                return Err(literal_mismatch(leaf_kind, PrimitiveKind::F64, literal, location));
            }

            let value = if leaf_kind == PrimitiveKind::F32 {
                *value as f32 as f64
            } else {
                *value
            };
            (ExpressionKind::Float(value), leaf_kind)
        }

        Literal::Bool(value) => (ExpressionKind::Bool(*value), PrimitiveKind::Bool),
        Literal::Byte(value) => (ExpressionKind::Int(*value as i128), PrimitiveKind::U8),

        Literal::ByteString(_) | Literal::Char(_) | Literal::String(_) => {
            return Err(unsupported_literal(literal, location));
        }
    };

    Ok(Expression::new(
        value,
        Type::Primitive(data_kind),
        location.to_owned(),
    ))
}

// A literal fits when its bit pattern fits the kind's width. The stored value is wrapped,
// so 255s8 is -1 and -128s8 stays -128 once negated.
fn integer_literal(
    value: u64,
    kind: PrimitiveKind,
    location: &TextLocation,
) -> Result<i128, CompilerError> {
    let bits = kind.bit_width();
    if bits < 64 && value >> bits != 0 {
        return_type_error!(
            ErrorKind::LiteralOutOfRange {
                literal: value.to_string(),
                kind: Type::Primitive(kind),
            },
            format!("{value} doesn't fit in {kind}"),
            location,
            {
                ExpectedType => kind,
            }
        )
    }

    Ok(kind.wrap(value as i128))
}

fn literal_mismatch(
    expected: PrimitiveKind,
    found: PrimitiveKind,
    literal: &Literal,
    location: &TextLocation,
) -> CompilerError {
    CompilerError::new(
        ErrorKind::TypeMismatch {
            expected: Type::Primitive(expected),
            found: Type::Primitive(found),
        },
        format!("{} can't be a {expected} literal", literal_text(literal)),
        location.to_owned(),
    )
}

fn unsupported_literal(literal: &Literal, location: &TextLocation) -> CompilerError {
    CompilerError::new(
        ErrorKind::UnsupportedLiteral {
            literal: literal_text(literal),
        },
        format!(
            "{} has no primitive type to be stored in",
            literal_text(literal)
        ),
        location.to_owned(),
    )
}

fn literal_text(literal: &Literal) -> String {
    match literal {
        Literal::Integer { value, .. } => value.to_string(),
        Literal::Float { value, .. } => value.to_string(),
        Literal::Bool(value) => value.to_string(),
        Literal::Byte(value) => format!("b'{}'", value.escape_ascii()),
        Literal::ByteString(bytes) => format!("b\"{}\"", bytes.escape_ascii()),
        Literal::Char(value) => format!("'{value}'"),
        Literal::String(value) => format!("\"{value}\""),
    }
}

/// Whether the type of an expression depends on the type expected of it.
/// Overload resolution lowers these once per candidate.
pub fn is_hint_sensitive(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(Literal::ByteString(_)) => false,
        ExprKind::Literal(_) | ExprKind::Unary { .. } | ExprKind::Binary { .. } => {
            is_literal_tree(expr) && find_suffix(expr).is_none()
        }
        ExprKind::Tuple(elements) => elements.iter().any(is_hint_sensitive),
        ExprKind::Array(elements) => {
            elements.is_empty() || elements.iter().any(is_hint_sensitive)
        }
        ExprKind::Block {
            expressions,
            trailing_semicolon,
        } => !trailing_semicolon && expressions.last().is_some_and(is_hint_sensitive),
        ExprKind::Reference(value) => is_hint_sensitive(value),
        ExprKind::Match { arms, .. } => arms.iter().any(|arm| is_hint_sensitive(&arm.body)),
        _ => false,
    }
}

// ------------------------
// Expressions
// ------------------------
impl FunctionBuilder<'_> {
    pub fn lower_expression(
        &mut self,
        expr: &Expr,
        hint: Option<&Type>,
    ) -> Result<Expression, CompilerError> {
        let location = &expr.location;

        match &expr.kind {
            ExprKind::Literal(Literal::ByteString(bytes)) => {
                let element = Type::Primitive(PrimitiveKind::U8);
                let elements = bytes
                    .iter()
                    .map(|byte| {
                        Expression::new(
                            ExpressionKind::Int(*byte as i128),
                            element.to_owned(),
                            location.to_owned(),
                        )
                    })
                    .collect();

                Ok(Expression::new(
                    ExpressionKind::Array(elements),
                    Type::Array {
                        element: Box::new(element),
                        length: bytes.len() as u32,
                    },
                    location.to_owned(),
                ))
            }

            ExprKind::Literal(literal @ (Literal::Char(_) | Literal::String(_))) => {
                Err(unsupported_literal(literal, location))
            }

            ExprKind::Literal(_) | ExprKind::Unary { .. } | ExprKind::Binary { .. } => {
                if !is_literal_tree(expr) {
                    return_rule_error!(
                        ErrorKind::NonConstantOperand,
                        "Operators can only be applied to literals, not to parameters or calls",
                        location,
                        {
                            PrimarySuggestion => "Call a function like add(a, b) instead",
                        }
                    )
                }

                lower_literal_tree(expr, hint.and_then(Type::literal_hint))
            }

            ExprKind::Tuple(elements) => {
                let element_hints: Option<&[Type]> = match hint {
                    Some(Type::Tuple(hints)) if hints.len() == elements.len() => Some(hints),
                    _ => None,
                };

                let mut lowered = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    let element_hint = element_hints.map(|hints| &hints[index]);
                    lowered.push(self.lower_expression(element, element_hint)?);
                }

                let data_type =
                    Type::Tuple(lowered.iter().map(|element| element.data_type.to_owned()).collect());
                Ok(Expression::new(
                    ExpressionKind::Tuple(lowered),
                    data_type,
                    location.to_owned(),
                ))
            }

            ExprKind::Array(elements) => self.lower_array(elements, hint, location),

            ExprKind::Identifier(name) => {
                let Some(index) = self.params.iter().position(|param| &param.name == name) else {
                    return_rule_error!(
                        ErrorKind::UnknownIdentifier {
                            name: name.to_owned(),
                        },
                        format!("'{name}' is not a parameter of this function"),
                        location,
                        {
                            VariableName => name,
                        }
                    )
                };

                Ok(Expression::new(
                    ExpressionKind::Local(LocalId(index as u32)),
                    self.params[index].data_type.to_owned(),
                    location.to_owned(),
                ))
            }

            ExprKind::Call { name, args } => {
                let receiver: Vec<&Expr> = args.iter().collect();
                self.desugar_call(name, receiver, Vec::new(), location)
            }

            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                // (a, b).f(c) spreads the tuple, a.f(c) is the mono-tuple (a)
                let receiver_items: Vec<&Expr> = match &receiver.kind {
                    ExprKind::Tuple(items) if !items.is_empty() => items.iter().collect(),
                    _ => vec![receiver.as_ref()],
                };
                let remaining: Vec<&Expr> = args.iter().collect();
                self.desugar_call(method, receiver_items, remaining, location)
            }

            ExprKind::Cast { value, target } => {
                let target = self
                    .symbols
                    .resolve_type(target, &self.scope, location)?
                    .substitute(&self.bindings);
                let value = self.lower_expression(value, Some(&target))?;

                match cast_kind(&value.data_type, &target) {
                    CastKind::Identity => Ok(Expression::new(value.kind, target, value.location)),
                    CastKind::Illegal => {
                        return_type_error!(
                            ErrorKind::IllegalCast {
                                from: value.data_type.to_owned(),
                                to: target.to_owned(),
                            },
                            format!("Can't cast {} to {target}", value.data_type),
                            location,
                            {
                                FoundType => value.data_type,
                                ExpectedType => target,
                            }
                        )
                    }
                    CastKind::Implicit | CastKind::ExplicitOnly => Ok(Expression::new(
                        ExpressionKind::Cast {
                            value: Box::new(value),
                            origin: CastOrigin::Explicit,
                        },
                        target,
                        location.to_owned(),
                    )),
                }
            }

            ExprKind::Reference(value) => {
                let inner_hint = match hint {
                    Some(Type::Reference { target, .. }) | Some(Type::Pointer(target)) => {
                        Some(target.as_ref())
                    }
                    _ => None,
                };

                let value = self.lower_expression(value, inner_hint)?;
                let data_type = Type::reference_to(value.data_type.to_owned());
                Ok(Expression::new(
                    ExpressionKind::Reference(Box::new(value)),
                    data_type,
                    location.to_owned(),
                ))
            }

            ExprKind::Dereference(value) => {
                let value = self.lower_expression(value, None)?;
                let data_type = match &value.data_type {
                    Type::Reference { target, .. } | Type::Pointer(target) => {
                        target.as_ref().to_owned()
                    }
                    other => {
                        return_type_error!(
                            ErrorKind::TypeMismatch {
                                expected: Type::reference_to(other.to_owned()),
                                found: other.to_owned(),
                            },
                            format!("Only references and pointers can be dereferenced, found {other}"),
                            location
                        )
                    }
                };

                Ok(Expression::new(
                    ExpressionKind::Dereference(Box::new(value)),
                    data_type,
                    location.to_owned(),
                ))
            }

            ExprKind::Block {
                expressions,
                trailing_semicolon,
            } => {
                let has_value = !trailing_semicolon && !expressions.is_empty();
                let mut lowered = Vec::with_capacity(expressions.len());

                for (index, expression) in expressions.iter().enumerate() {
                    let is_value = has_value && index + 1 == expressions.len();
                    let expression_hint = if is_value { hint } else { None };
                    lowered.push(self.lower_expression(expression, expression_hint)?);
                }

                let data_type = match lowered.last() {
                    Some(last) if has_value => last.data_type.to_owned(),
                    _ => Type::unit(),
                };

                Ok(Expression::new(
                    ExpressionKind::Block {
                        expressions: lowered,
                        has_value,
                    },
                    data_type,
                    location.to_owned(),
                ))
            }

            ExprKind::Match { scrutinee, arms } => {
                self.lower_match(scrutinee, arms, hint, location)
            }
        }
    }

    fn lower_array(
        &mut self,
        elements: &[Expr],
        hint: Option<&Type>,
        location: &TextLocation,
    ) -> Result<Expression, CompilerError> {
        let hinted_element = match hint {
            Some(Type::Array { element, .. }) | Some(Type::Slice(element)) => {
                Some(element.as_ref().to_owned())
            }
            _ => None,
        };

        let mut lowered = Vec::with_capacity(elements.len());
        let mut element_type = hinted_element;

        for element in elements {
            let value = self.lower_expression(element, element_type.as_ref())?;
            let value = match &element_type {
                Some(element_type) => self.coerce(value, element_type, CoercionSite::ArrayElement)?,
                None => {
                    element_type = Some(value.data_type.to_owned());
                    value
                }
            };
            lowered.push(value);
        }

        let Some(element_type) = element_type else {
            return_type_error!(
                ErrorKind::CannotInferType,
                "Can't infer the element type of an empty array",
                location,
                {
                    PrimarySuggestion => "Cast it to an array type, e.g. [] as [u8; 0]",
                }
            )
        };

        Ok(Expression::new(
            ExpressionKind::Array(lowered),
            Type::Array {
                element: Box::new(element_type),
                length: elements.len() as u32,
            },
            location.to_owned(),
        ))
    }

    fn lower_match(
        &mut self,
        scrutinee: &Expr,
        arms: &[MatchArm],
        hint: Option<&Type>,
        location: &TextLocation,
    ) -> Result<Expression, CompilerError> {
        let scrutinee = self.lower_expression(scrutinee, None)?;

        let mut checked_arms = Vec::with_capacity(arms.len());
        for arm in arms {
            let patterns = arm
                .patterns
                .iter()
                .map(|pattern| check_pattern(pattern, &scrutinee.data_type, &arm.location))
                .collect::<Result<Vec<_>, _>>()?;

            checked_arms.push(CheckedArm {
                patterns,
                location: arm.location.to_owned(),
            });
        }

        let (decision, warnings) =
            match_compiler::compile(&scrutinee.data_type, &checked_arms, location)?;
        self.warnings.extend(warnings);

        // Arms agree on the expected type when there is one, otherwise on the first arm's type
        let mut target = hint.filter(|hint| !hint.contains_param()).cloned();
        let mut lowered_arms = Vec::with_capacity(arms.len());

        for arm in arms {
            let body = self.lower_expression(&arm.body, target.as_ref().or(hint))?;
            let body = match &target {
                Some(target) => self.coerce(body, target, CoercionSite::MatchArm)?,
                None => {
                    target = Some(body.data_type.to_owned());
                    body
                }
            };
            lowered_arms.push(body);
        }

        let data_type = target.unwrap_or_else(Type::unit);

        Ok(Expression::new(
            ExpressionKind::Match(Box::new(HirMatch {
                scrutinee,
                decision,
                arms: lowered_arms,
            })),
            data_type,
            location.to_owned(),
        ))
    }

    /// Makes `value` have type `target`, inserting an implicit cast when one is needed.
    pub fn coerce(
        &self,
        value: Expression,
        target: &Type,
        site: CoercionSite,
    ) -> Result<Expression, CompilerError> {
        match cast_kind(&value.data_type, target) {
            CastKind::Identity => Ok(value),

            CastKind::Implicit => {
                let location = value.location.to_owned();
                Ok(Expression::new(
                    ExpressionKind::Cast {
                        value: Box::new(value),
                        origin: CastOrigin::Implicit,
                    },
                    target.to_owned(),
                    location,
                ))
            }

            CastKind::ExplicitOnly => {
                return_type_error!(
                    ErrorKind::ImplicitCastNotAllowed {
                        from: value.data_type.to_owned(),
                        to: target.to_owned(),
                    },
                    format!(
                        "{} can only become {target} with an explicit cast",
                        value.data_type
                    ),
                    value.location,
                    {
                        PrimarySuggestion => format!("Write `as {target}`"),
                    }
                )
            }

            CastKind::Illegal => {
                let (kind, msg) = match site {
                    CoercionSite::Return => (
                        ErrorKind::ReturnTypeMismatch {
                            expected: target.to_owned(),
                            found: value.data_type.to_owned(),
                        },
                        format!(
                            "Function should return {target}, but its body is {}",
                            value.data_type
                        ),
                    ),
                    CoercionSite::MatchArm => (
                        ErrorKind::TypeMismatch {
                            expected: target.to_owned(),
                            found: value.data_type.to_owned(),
                        },
                        format!(
                            "Match arms must all be {target}, found {}",
                            value.data_type
                        ),
                    ),
                    CoercionSite::ArrayElement => (
                        ErrorKind::TypeMismatch {
                            expected: target.to_owned(),
                            found: value.data_type.to_owned(),
                        },
                        format!(
                            "Array elements must all be {target}, found {}",
                            value.data_type
                        ),
                    ),
                };

                Err(CompilerError::new(kind, msg, value.location.to_owned())
                    .with_metadata(ErrorMetaDataKey::ExpectedType, target.to_string())
                    .with_metadata(ErrorMetaDataKey::FoundType, value.data_type.to_string()))
            }
        }
    }
}

// ------------------------
// Patterns
// ------------------------
fn check_pattern(
    pattern: &Pattern,
    scrutinee: &Type,
    location: &TextLocation,
) -> Result<CheckedPattern, CompilerError> {
    let (literal, negated) = match pattern {
        Pattern::Wildcard => return Ok(CheckedPattern::Wildcard),
        Pattern::Literal { value, negated } => (value, *negated),
    };

    let pattern_kind = match literal {
        Literal::Integer { suffix, .. } => suffix.unwrap_or(PrimitiveKind::S32),
        Literal::Float { suffix, .. } => suffix.unwrap_or(PrimitiveKind::F64),
        Literal::Bool(_) => PrimitiveKind::Bool,
        Literal::Byte(_) => PrimitiveKind::U8,
        _ => return Err(unsupported_literal(literal, location)),
    };

    let Some(kind) = scrutinee.as_primitive() else {
        return_type_error!(
            ErrorKind::TypeMismatch {
                expected: scrutinee.to_owned(),
                found: Type::Primitive(pattern_kind),
            },
            format!("A literal pattern can't match a value of type {scrutinee}"),
            location
        )
    };

    let mismatch = || literal_mismatch(kind, pattern_kind, literal, location);

    let value = match literal {
        Literal::Integer { value, suffix } => {
            if !kind.is_integer() || suffix.is_some_and(|suffix| suffix != kind) {
                return Err(mismatch());
            }
            integer_pattern(*value as i128, negated, kind, location)?
        }

        Literal::Byte(value) => {
            if kind != PrimitiveKind::U8 {
                return Err(mismatch());
            }
            integer_pattern(*value as i128, negated, kind, location)?
        }

        Literal::Float { value, suffix } => {
            if !kind.is_float() || suffix.is_some_and(|suffix| suffix != kind) {
                return Err(mismatch());
            }
            let value = if negated { -*value } else { *value };
            let value = if kind == PrimitiveKind::F32 {
                value as f32 as f64
            } else {
                value
            };
            PatternValue::Float(value)
        }

        Literal::Bool(value) => {
            if kind != PrimitiveKind::Bool {
                return Err(mismatch());
            }
            if negated {
                return_type_error!(
                    ErrorKind::InvalidOperator {
                        operator: String::from("-"),
                        operand: scrutinee.to_owned(),
                    },
                    "A bool pattern can't be negated",
                    location
                )
            }
            PatternValue::Bool(*value)
        }

        _ => return Err(unsupported_literal(literal, location)),
    };

    Ok(CheckedPattern::Value(value))
}

// Patterns compare exact values, so they must lie inside the kind's range
fn integer_pattern(
    value: i128,
    negated: bool,
    kind: PrimitiveKind,
    location: &TextLocation,
) -> Result<PatternValue, CompilerError> {
    let value = if negated { -value } else { value };

    match kind.integer_range() {
        Some((min, max)) if value >= min && value <= max => Ok(PatternValue::Int(value)),
        _ => {
            return_type_error!(
                ErrorKind::LiteralOutOfRange {
                    literal: value.to_string(),
                    kind: Type::Primitive(kind),
                },
                format!("Pattern {value} can never match a {kind}"),
                location
            )
        }
    }
}

#[cfg(test)]
#[path = "tests/hir_expression_tests.rs"]
mod tests;
