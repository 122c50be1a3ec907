//! Turns written types into canonical [`Type`]s.
//!
//! A path is looked up in the generic scope first, then among the primitives, then among the
//! module's named types. Array lengths are an expression in the syntax, so they are checked and
//! folded here with the same literal rules every other constant expression follows.

use crate::compiler_frontend::ast::ast_nodes::{Expr, GenericParam, TextLocation, TypeArg, TypeExpr};
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind};
use crate::compiler_frontend::datatypes::{PrimitiveKind, Type};
use crate::compiler_frontend::hir::hir_expression::{is_literal_tree, lower_literal_tree};
use crate::compiler_frontend::hir::hir_nodes::ExpressionKind;
use crate::compiler_frontend::optimizers::constant_folding::fold;
use crate::compiler_frontend::symbol_table::NamedTypes;
use crate::{return_rule_error, return_type_error};

pub const STATIC_LIFETIME: &str = "'static";

/// Generic and lifetime parameters visible at a point in a signature.
#[derive(Debug, Clone, Default)]
pub struct GenericScope {
    type_params: Vec<String>,
    lifetimes: Vec<String>,
}

impl GenericScope {
    pub fn empty() -> Self {
        GenericScope::default()
    }

    pub fn from_params(
        params: &[GenericParam],
        location: &TextLocation,
    ) -> Result<GenericScope, CompilerError> {
        GenericScope::empty().extended(params, location)
    }

    /// A nested scope, e.g. the generic list of a function pointer type.
    pub fn extended(
        &self,
        params: &[GenericParam],
        location: &TextLocation,
    ) -> Result<GenericScope, CompilerError> {
        let mut scope = self.to_owned();

        for param in params {
            let (names, name) = match param {
                GenericParam::Type(name) => (&mut scope.type_params, name),
                GenericParam::Lifetime(name) => (&mut scope.lifetimes, name),
            };

            if names.contains(name) || name == STATIC_LIFETIME {
                return_rule_error!(
                    ErrorKind::DuplicateDefinition {
                        name: name.to_owned(),
                    },
                    format!("Generic parameter '{name}' is declared more than once"),
                    location
                )
            }

            names.push(name.to_owned());
        }

        Ok(scope)
    }

    pub fn has_type_param(&self, name: &str) -> bool {
        self.type_params.iter().any(|param| param == name)
    }

    pub fn has_lifetime(&self, name: &str) -> bool {
        name == STATIC_LIFETIME || self.lifetimes.iter().any(|lifetime| lifetime == name)
    }
}

pub fn resolve_type(
    ty: &TypeExpr,
    scope: &GenericScope,
    named_types: &NamedTypes,
    location: &TextLocation,
) -> Result<Type, CompilerError> {
    let resolve = |ty: &TypeExpr| resolve_type(ty, scope, named_types, location);

    match ty {
        TypeExpr::Tuple(elements) => Ok(Type::Tuple(
            elements.iter().map(resolve).collect::<Result<_, _>>()?,
        )),

        TypeExpr::Slice(element) => Ok(Type::Slice(Box::new(resolve(element.as_ref())?))),

        TypeExpr::Array { element, length } => Ok(Type::Array {
            element: Box::new(resolve(element.as_ref())?),
            length: array_length(length.as_ref())?,
        }),

        TypeExpr::Reference { lifetime, target } => {
            if let Some(lifetime) = lifetime {
                check_lifetime(lifetime, scope, location)?;
            }

            Ok(Type::Reference {
                lifetime: lifetime.to_owned(),
                target: Box::new(resolve(target.as_ref())?),
            })
        }

        TypeExpr::Pointer(target) => Ok(Type::Pointer(Box::new(resolve(target.as_ref())?))),

        TypeExpr::FunctionPointer {
            generics,
            params,
            result,
        } => {
            let inner_scope = scope.extended(generics, location)?;
            let resolve_inner = |ty: &TypeExpr| resolve_type(ty, &inner_scope, named_types, location);

            Ok(Type::FunctionPointer {
                generics: generics.to_owned(),
                params: params.iter().map(resolve_inner).collect::<Result<_, _>>()?,
                result: Box::new(resolve_inner(result.as_ref())?),
            })
        }

        TypeExpr::Path { name, args } => resolve_path(name, args, scope, named_types, location),
    }
}

fn resolve_path(
    name: &str,
    args: &[TypeArg],
    scope: &GenericScope,
    named_types: &NamedTypes,
    location: &TextLocation,
) -> Result<Type, CompilerError> {
    if scope.has_type_param(name) {
        expect_arity(name, 0, 0, args, location)?;
        return Ok(Type::Param(name.to_owned()));
    }

    if let Some(kind) = PrimitiveKind::from_name(name) {
        expect_arity(name, 0, 0, args, location)?;
        return Ok(Type::Primitive(kind));
    }

    let Some(declaration) = named_types.get(name) else {
        return_rule_error!(
            ErrorKind::UnknownIdentifier {
                name: name.to_owned(),
            },
            format!("Unknown type '{name}'"),
            location,
            {
                VariableName => name,
            }
        )
    };

    let expected_lifetimes = declaration
        .generics
        .iter()
        .filter(|generic| matches!(generic, GenericParam::Lifetime(_)))
        .count();
    let expected_types = declaration.generics.len() - expected_lifetimes;
    expect_arity(name, expected_lifetimes, expected_types, args, location)?;

    let mut type_args = Vec::with_capacity(expected_types);
    for arg in args {
        match arg {
            TypeArg::Lifetime(lifetime) => check_lifetime(lifetime, scope, location)?,
            TypeArg::Type(ty) => type_args.push(resolve_type(ty, scope, named_types, location)?),
        }
    }

    Ok(Type::Named {
        ident: name.to_owned(),
        type_args,
    })
}

fn expect_arity(
    name: &str,
    lifetimes: usize,
    types: usize,
    args: &[TypeArg],
    location: &TextLocation,
) -> Result<(), CompilerError> {
    let found_lifetimes = args
        .iter()
        .filter(|arg| matches!(arg, TypeArg::Lifetime(_)))
        .count();
    let found_types = args.len() - found_lifetimes;

    if found_lifetimes != lifetimes || found_types != types {
        return_type_error!(
            ErrorKind::ArityMismatch {
                name: name.to_owned(),
                expected: lifetimes + types,
                found: args.len(),
            },
            format!(
                "'{name}' takes {lifetimes} lifetime and {types} type arguments, found {found_lifetimes} and {found_types}"
            ),
            location
        )
    }

    Ok(())
}

fn check_lifetime(
    lifetime: &str,
    scope: &GenericScope,
    location: &TextLocation,
) -> Result<(), CompilerError> {
    if !scope.has_lifetime(lifetime) {
        return_rule_error!(
            ErrorKind::UnknownIdentifier {
                name: lifetime.to_owned(),
            },
            format!("Lifetime '{lifetime}' is not declared"),
            location,
            {
                PrimarySuggestion => "Declare it in the generic list, or use 'static",
            }
        )
    }

    Ok(())
}

/// Array lengths must fold to a non-negative integer that fits in a u32.
pub fn array_length(length: &Expr) -> Result<u32, CompilerError> {
    if !is_literal_tree(length) {
        return_rule_error!(
            ErrorKind::InvalidArrayLength {
                reason: String::from("not a compile time constant"),
            },
            "Array lengths must be integer literals or literal expressions",
            length.location
        )
    }

    let folded = fold(lower_literal_tree(length, Some(PrimitiveKind::S64))?)?;

    let value = match folded.kind {
        ExpressionKind::Int(value) => value,
        _ => {
            return_rule_error!(
                ErrorKind::InvalidArrayLength {
                    reason: format!("{} is not an integer", folded.data_type),
                },
                format!("Array length must be an integer, found {}", folded.data_type),
                length.location
            )
        }
    };

    if value < 0 {
        return_rule_error!(
            ErrorKind::InvalidArrayLength {
                reason: format!("{value} is negative"),
            },
            format!("Array length can't be negative, found {value}"),
            length.location
        )
    }

    match u32::try_from(value) {
        Ok(length) => Ok(length),
        Err(_) => {
            return_rule_error!(
                ErrorKind::InvalidArrayLength {
                    reason: format!("{value} is too large"),
                },
                format!("Array length {value} doesn't fit in linear memory"),
                length.location
            )
        }
    }
}

#[cfg(test)]
#[path = "tests/type_resolver_tests.rs"]
mod tests;
