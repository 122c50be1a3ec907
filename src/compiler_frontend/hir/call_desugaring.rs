//! Call desugaring and overload resolution.
//!
//! Every call form ends up as the same canonical prefix call:
//!
//! ```text
//! f(a, b)          receiver (a, b), no remaining args
//! a.f(b)           receiver (a),    remaining b
//! (a, b).f(c)      receiver (a, b), remaining c
//! ```
//!
//! Overloads are filtered by arity, then by whether each receiver item casts implicitly to the
//! matching parameter. Exactly one candidate may survive. Remaining arguments are then checked
//! against the chosen candidate one at a time.

use crate::compiler_frontend::ast::ast_nodes::{Expr, ExprKind, TextLocation};
use crate::compiler_frontend::casts::{CastKind, cast_kind};
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind, ErrorMetaDataKey};
use crate::compiler_frontend::datatypes::Type;
use crate::compiler_frontend::hir::hir_builder::{FunctionBuilder, InstantiationRequest};
use crate::compiler_frontend::hir::hir_expression::is_hint_sensitive;
use crate::compiler_frontend::hir::hir_nodes::{
    CallArgument, CanonicalCall, Expression, ExpressionKind, FunctionRef,
};
use crate::compiler_frontend::symbol_table::{FunctionId, FunctionOrigin};
use crate::{hir_log, return_rule_error, return_type_error};
use rustc_hash::FxHashMap;

type Bindings = FxHashMap<String, Type>;

// A candidate whose receiver items all cast implicitly to its parameters
struct ViableCandidate {
    id: FunctionId,
    bindings: Bindings,
    receiver: Vec<Expression>,
}

enum CandidateCheck {
    Viable(ViableCandidate),
    Rejected,
}

// (a) is a mono-tuple in argument position, so ((a)) and (a) are both just a
fn peel_mono_tuple(mut expr: &Expr) -> &Expr {
    while let ExprKind::Tuple(items) = &expr.kind {
        if items.len() != 1 {
            break;
        }
        expr = &items[0];
    }
    expr
}

impl FunctionBuilder<'_> {
    pub(crate) fn desugar_call(
        &mut self,
        name: &str,
        receiver: Vec<&Expr>,
        remaining: Vec<&Expr>,
        location: &TextLocation,
    ) -> Result<Expression, CompilerError> {
        let receiver: Vec<&Expr> = receiver.into_iter().map(peel_mono_tuple).collect();
        let remaining: Vec<&Expr> = remaining.into_iter().map(peel_mono_tuple).collect();

        let symbols = self.symbols;
        let overloads = symbols.overloads(name);
        if overloads.is_empty() {
            return_rule_error!(
                ErrorKind::UnknownIdentifier {
                    name: name.to_owned(),
                },
                format!("There is no function called '{name}'"),
                location,
                {
                    FunctionName => name,
                }
            )
        }

        let arg_count = receiver.len() + remaining.len();
        let candidates: Vec<FunctionId> = overloads
            .iter()
            .copied()
            .filter(|id| symbols.function(*id).signature.params.len() == arg_count)
            .collect();

        if candidates.is_empty() {
            if let [only] = overloads {
                let expected = symbols.function(*only).signature.params.len();
                return_type_error!(
                    ErrorKind::ArityMismatch {
                        name: name.to_owned(),
                        expected,
                        found: arg_count,
                    },
                    format!("'{name}' takes {expected} arguments, but {arg_count} were given"),
                    location,
                    {
                        FunctionName => name,
                    }
                )
            }

            return Err(no_matching_function(name, arg_count, location));
        }

        // Anything whose type doesn't depend on the parameter is lowered once up front
        let mut pre_lowered = Vec::with_capacity(receiver.len());
        for item in &receiver {
            if is_hint_sensitive(item) {
                pre_lowered.push(None);
            } else {
                pre_lowered.push(Some(self.lower_expression(item, None)?));
            }
        }

        let mut viable = Vec::new();
        for id in &candidates {
            let mark = self.mark();
            match self.check_candidate(*id, &receiver, &pre_lowered)? {
                CandidateCheck::Viable(candidate) => viable.push(candidate),
                CandidateCheck::Rejected => self.rollback(mark),
            }
        }

        if viable.len() > 1 {
            return_type_error!(
                ErrorKind::AmbiguousCall {
                    name: name.to_owned(),
                    candidates: viable.len(),
                },
                format!(
                    "Call to '{name}' is ambiguous, {} overloads accept these arguments",
                    viable.len()
                ),
                location,
                {
                    FunctionName => name,
                    PrimarySuggestion => "Add an explicit cast to pick one overload",
                }
            )
        }

        let Some(chosen) = viable.pop() else {
            return Err(no_matching_function(name, arg_count, location));
        };

        self.finish_call(name, chosen, &remaining, location)
    }

    fn check_candidate(
        &mut self,
        id: FunctionId,
        receiver: &[&Expr],
        pre_lowered: &[Option<Expression>],
    ) -> Result<CandidateCheck, CompilerError> {
        let symbols = self.symbols;
        let signature = &symbols.function(id).signature;
        let is_generic = signature.is_generic();
        let mut bindings = Bindings::default();
        let mut items = Vec::with_capacity(receiver.len());

        for (index, item) in receiver.iter().enumerate() {
            let param = &signature.params[index];

            let value = match &pre_lowered[index] {
                Some(value) => value.to_owned(),
                None => {
                    let hint = param.substitute(&bindings);
                    match self.lower_expression(item, Some(&hint)) {
                        Ok(value) => value,

                        // Folding errors are wrong under every candidate
                        Err(e) if e.kind == ErrorKind::DivisionByZero => return Err(e),
                        Err(_) => return Ok(CandidateCheck::Rejected),
                    }
                }
            };

            if is_generic && !unify(param, &value.data_type, &mut bindings) {
                return Ok(CandidateCheck::Rejected);
            }

            let concrete = param.substitute(&bindings);
            if concrete.contains_param() || !cast_kind(&value.data_type, &concrete).is_implicit_legal() {
                return Ok(CandidateCheck::Rejected);
            }

            items.push(value);
        }

        Ok(CandidateCheck::Viable(ViableCandidate {
            id,
            bindings,
            receiver: items,
        }))
    }

    fn finish_call(
        &mut self,
        name: &str,
        chosen: ViableCandidate,
        remaining: &[&Expr],
        location: &TextLocation,
    ) -> Result<Expression, CompilerError> {
        let symbols = self.symbols;
        let symbol = symbols.function(chosen.id);
        let signature = &symbol.signature;
        let mut bindings = chosen.bindings;
        let receiver_len = chosen.receiver.len();

        let mut values = chosen.receiver;
        for (offset, arg) in remaining.iter().enumerate() {
            let param = &signature.params[receiver_len + offset];
            let hint = param.substitute(&bindings);
            let value = self.lower_expression(arg, Some(&hint))?;

            if signature.is_generic() && !unify(param, &value.data_type, &mut bindings) {
                let expected = param.substitute(&bindings);
                return_type_error!(
                    ErrorKind::TypeMismatch {
                        expected: expected.to_owned(),
                        found: value.data_type.to_owned(),
                    },
                    format!(
                        "Argument {} of '{name}' should be {expected}, found {}",
                        receiver_len + offset + 1,
                        value.data_type
                    ),
                    value.location
                )
            }

            values.push(value);
        }

        let mut type_args = Vec::new();
        for type_param in signature.type_params() {
            match bindings.get(type_param) {
                Some(bound) => type_args.push(bound.to_owned()),
                None => {
                    return_type_error!(
                        ErrorKind::CannotInferType,
                        format!("Can't infer type parameter '{type_param}' of '{name}'"),
                        location,
                        {
                            FunctionName => name,
                        }
                    )
                }
            }
        }

        let mut args = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let param_type = signature.params[index].substitute(&bindings);
            let cast = cast_kind(&value.data_type, &param_type);

            match cast {
                CastKind::Identity | CastKind::Implicit => {}
                CastKind::ExplicitOnly => {
                    return_type_error!(
                        ErrorKind::ImplicitCastNotAllowed {
                            from: value.data_type.to_owned(),
                            to: param_type.to_owned(),
                        },
                        format!(
                            "Argument {} of '{name}' is {}, which only becomes {param_type} with an explicit cast",
                            index + 1,
                            value.data_type
                        ),
                        value.location,
                        {
                            PrimarySuggestion => format!("Write `as {param_type}`"),
                        }
                    )
                }
                CastKind::Illegal => {
                    return_type_error!(
                        ErrorKind::IllegalCast {
                            from: value.data_type.to_owned(),
                            to: param_type.to_owned(),
                        },
                        format!(
                            "Argument {} of '{name}' is {}, which can't be passed as {param_type}",
                            index + 1,
                            value.data_type
                        ),
                        value.location,
                        {
                            ExpectedType => param_type,
                            FoundType => value.data_type,
                        }
                    )
                }
            }

            args.push(CallArgument {
                value,
                cast,
                param_type,
            });
        }

        let target = FunctionRef {
            id: chosen.id,
            type_args,
        };

        if !target.type_args.is_empty() && matches!(symbol.origin, FunctionOrigin::Local { .. }) {
            self.requests.push(InstantiationRequest {
                target: target.to_owned(),
                location: location.to_owned(),
            });
        }

        let return_type = signature.return_type.substitute(&bindings);
        hir_log!("Resolved call to ", Blue name, " as function ", Bright chosen.id.0);

        Ok(Expression::new(
            ExpressionKind::Call(CanonicalCall {
                target,
                args,
                return_type: return_type.to_owned(),
            }),
            return_type,
            location.to_owned(),
        ))
    }
}

fn no_matching_function(name: &str, arg_count: usize, location: &TextLocation) -> CompilerError {
    CompilerError::new(
        ErrorKind::NoMatchingFunction {
            name: name.to_owned(),
        },
        format!("No overload of '{name}' accepts these {arg_count} arguments"),
        location.to_owned(),
    )
    .with_metadata(ErrorMetaDataKey::FunctionName, name)
}

/// Binds the generic parameters in `param` by matching it against `arg`.
///
/// The one step adjustments a cast could make are allowed, so `&T` binds against a plain
/// value and `(T)` against its element. Whether the final cast is legal is checked afterwards.
pub fn unify(param: &Type, arg: &Type, bindings: &mut Bindings) -> bool {
    if !param.contains_param() {
        return true;
    }

    if let Type::Param(name) = param {
        if !bindings.contains_key(name) {
            bindings.insert(name.to_owned(), arg.erase_lifetimes());
        }
        return true;
    }

    match (param, arg) {
        (Type::Tuple(params), Type::Tuple(args)) if params.len() == args.len() => params
            .iter()
            .zip(args)
            .all(|(param, arg)| unify(param, arg, bindings)),

        (Type::Slice(param), Type::Slice(arg)) => unify(param, arg, bindings),
        (Type::Array { element: param, .. }, Type::Array { element: arg, .. }) => {
            unify(param, arg, bindings)
        }

        (Type::Reference { target: param, .. }, Type::Reference { target: arg, .. })
        | (Type::Pointer(param), Type::Pointer(arg))
        | (Type::Pointer(param), Type::Reference { target: arg, .. }) => {
            unify(param, arg, bindings)
        }

        (
            Type::FunctionPointer {
                params: params_a,
                result: result_a,
                ..
            },
            Type::FunctionPointer {
                params: params_b,
                result: result_b,
                ..
            },
        ) if params_a.len() == params_b.len() => {
            params_a
                .iter()
                .zip(params_b)
                .all(|(param, arg)| unify(param, arg, bindings))
                && unify(result_a, result_b, bindings)
        }

        (
            Type::Named {
                ident: ident_a,
                type_args: args_a,
            },
            Type::Named {
                ident: ident_b,
                type_args: args_b,
            },
        ) if ident_a == ident_b && args_a.len() == args_b.len() => args_a
            .iter()
            .zip(args_b)
            .all(|(param, arg)| unify(param, arg, bindings)),

        // T -> &T, T -> *T
        (Type::Reference { target, .. }, arg) | (Type::Pointer(target), arg) => {
            unify(target, arg, bindings)
        }

        // T -> (T)
        (Type::Tuple(params), arg) if params.len() == 1 => unify(&params[0], arg, bindings),

        // (T) -> T
        (param, Type::Tuple(args)) if args.len() == 1 => unify(param, &args[0], bindings),

        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/call_desugaring_tests.rs"]
mod tests;
