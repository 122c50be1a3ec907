//! Replaces calls to `const fn`s whose folded body is a literal with that literal.
//!
//! Runs to a fixpoint, since replacing a call can turn the caller's own body into a literal.
//! Recursive const functions like `fibonacci` never fold to a literal and are left as calls.

use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::hir::hir_nodes::{
    CallArgument, CanonicalCall, Expression, ExpressionKind, FunctionRef, HirMatch, HirModule,
};
use crate::compiler_frontend::optimizers::constant_folding::fold;
use crate::eval_log;
use rustc_hash::FxHashMap;

type ConstValues = FxHashMap<FunctionRef, ExpressionKind>;

pub fn fold_const_calls(mut module: HirModule) -> Result<HirModule, CompilerError> {
    loop {
        let values = const_values(&module);
        if values.is_empty() {
            return Ok(module);
        }

        let mut changed = false;
        let mut functions = Vec::with_capacity(module.functions.len());
        for mut function in module.functions {
            let body = replace_calls(function.body, &values, &mut changed);
            function.body = fold(body)?;
            functions.push(function);
        }
        module.functions = functions;

        if !changed {
            return Ok(module);
        }
    }
}

fn const_values(module: &HirModule) -> ConstValues {
    module
        .functions
        .iter()
        .filter(|function| function.is_const && function.body.is_literal())
        .map(|function| (function.symbol.to_owned(), function.body.kind.to_owned()))
        .collect()
}

fn replace_calls(expression: Expression, values: &ConstValues, changed: &mut bool) -> Expression {
    let Expression {
        kind,
        data_type,
        location,
    } = expression;

    let kind = match kind {
        ExpressionKind::Call(call) => {
            if let Some(value) = values.get(&call.target) {
                eval_log!("Folded const call to ", Green format!("{value:?}"));
                *changed = true;
                value.to_owned()
            } else {
                let args = call
                    .args
                    .into_iter()
                    .map(|arg| CallArgument {
                        value: replace_calls(arg.value, values, changed),
                        cast: arg.cast,
                        param_type: arg.param_type,
                    })
                    .collect();

                ExpressionKind::Call(CanonicalCall {
                    target: call.target,
                    args,
                    return_type: call.return_type,
                })
            }
        }

        ExpressionKind::Tuple(elements) => ExpressionKind::Tuple(replace_all(elements, values, changed)),
        ExpressionKind::Array(elements) => ExpressionKind::Array(replace_all(elements, values, changed)),

        ExpressionKind::Cast { value, origin } => ExpressionKind::Cast {
            value: Box::new(replace_calls(*value, values, changed)),
            origin,
        },
        ExpressionKind::Reference(value) => {
            ExpressionKind::Reference(Box::new(replace_calls(*value, values, changed)))
        }
        ExpressionKind::Dereference(value) => {
            ExpressionKind::Dereference(Box::new(replace_calls(*value, values, changed)))
        }

        ExpressionKind::Block {
            expressions,
            has_value,
        } => ExpressionKind::Block {
            expressions: replace_all(expressions, values, changed),
            has_value,
        },

        ExpressionKind::Match(hir_match) => {
            let HirMatch {
                scrutinee,
                decision,
                arms,
            } = *hir_match;

            ExpressionKind::Match(Box::new(HirMatch {
                scrutinee: replace_calls(scrutinee, values, changed),
                decision,
                arms: replace_all(arms, values, changed),
            }))
        }

        other => other,
    };

    Expression::new(kind, data_type, location)
}

fn replace_all(
    expressions: Vec<Expression>,
    values: &ConstValues,
    changed: &mut bool,
) -> Vec<Expression> {
    expressions
        .into_iter()
        .map(|expression| replace_calls(expression, values, changed))
        .collect()
}

#[cfg(test)]
#[path = "tests/const_call_folding_tests.rs"]
mod tests;
