//! HIR Builder
//!
//! Responsible for lowering one function declaration -> HIR.
//!
//! This stage:
//! - Resolves identifiers against the parameter list
//! - Gives every literal a kind
//! - Desugars every call into a canonical prefix call
//! - Inserts implicit casts at call sites, return position and match arms
//! - Compiles match arms into decision trees
//! - Folds literal operator trees
//!
//! This stage does NOT:
//! - Check bodies of generic functions that nobody instantiates
//! - Fold calls to const functions (see `const_call_folding`)
//!
//! A builder only ever reads the symbol table, so builders for different functions can run
//! on different threads.

use crate::compiler_frontend::ast::ast_nodes::{FunctionDecl, TextLocation};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::datatypes::Type;
use crate::compiler_frontend::hir::hir_expression::CoercionSite;
use crate::compiler_frontend::hir::hir_nodes::{FunctionRef, HirFunction, HirParam};
use crate::compiler_frontend::optimizers::constant_folding::fold;
use crate::compiler_frontend::symbol_table::{FunctionSymbol, SymbolTable};
use crate::compiler_frontend::type_resolver::GenericScope;
use crate::{hir_log, return_compiler_error};
use rustc_hash::FxHashMap;

/// A generic function some checked body calls with concrete type arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantiationRequest {
    pub target: FunctionRef,
    pub location: TextLocation,
}

#[derive(Debug)]
pub struct LoweredFunction {
    pub function: HirFunction,
    pub warnings: Vec<CompilerWarning>,
    pub requests: Vec<InstantiationRequest>,
}

pub struct FunctionBuilder<'a> {
    pub(crate) symbols: &'a SymbolTable,

    // Generic parameters of the function being checked
    pub(crate) scope: GenericScope,

    // Concrete types for those parameters, empty unless this is an instantiation
    pub(crate) bindings: FxHashMap<String, Type>,

    pub(crate) params: Vec<HirParam>,
    pub(crate) requests: Vec<InstantiationRequest>,
    pub(crate) warnings: Vec<CompilerWarning>,
}

/// Lengths of the builder's side effect lists at some point in time.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BuilderMark {
    requests: usize,
    warnings: usize,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(symbols: &'a SymbolTable, scope: GenericScope) -> Self {
        FunctionBuilder {
            symbols,
            scope,
            bindings: FxHashMap::default(),
            params: Vec::new(),
            requests: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn mark(&self) -> BuilderMark {
        BuilderMark {
            requests: self.requests.len(),
            warnings: self.warnings.len(),
        }
    }

    // Overload candidates that get rejected must not leave requests or warnings behind
    pub(crate) fn rollback(&mut self, mark: BuilderMark) {
        self.requests.truncate(mark.requests);
        self.warnings.truncate(mark.warnings);
    }
}

/// Checks one function, or one instantiation of a generic function when `type_args` is not empty.
pub fn lower_function(
    symbols: &SymbolTable,
    decl: &FunctionDecl,
    symbol: &FunctionSymbol,
    type_args: &[Type],
) -> Result<LoweredFunction, CompilerError> {
    let signature = &symbol.signature;
    let type_params: Vec<&str> = signature.type_params().collect();

    if type_params.len() != type_args.len() {
        return_compiler_error!(format!(
            "'{}' was instantiated with {} type arguments but declares {}",
            symbol.name,
            type_args.len(),
            type_params.len()
        ))
    }

    let scope = GenericScope::from_params(&signature.generics, &symbol.location)?;
    let mut builder = FunctionBuilder::new(symbols, scope);

    for (name, ty) in type_params.iter().zip(type_args) {
        builder.bindings.insert((*name).to_owned(), ty.to_owned());
    }

    builder.params = signature
        .param_names
        .iter()
        .zip(&signature.params)
        .map(|(name, ty)| HirParam {
            name: name.to_owned(),
            data_type: ty.substitute(&builder.bindings),
        })
        .collect();

    let return_type = signature.return_type.substitute(&builder.bindings);

    let body = builder.lower_expression(&decl.body, Some(&return_type))?;
    let body = builder.coerce(body, &return_type, CoercionSite::Return)?;
    let body = fold(body)?;

    let name = mangled_name(&symbol.name, type_args);
    hir_log!("Lowered ", Blue name, " to ", Green body.to_string());

    Ok(LoweredFunction {
        function: HirFunction {
            name,
            symbol: FunctionRef {
                id: symbol.id,
                type_args: type_args.to_owned(),
            },
            params: builder.params,
            return_type,
            body,
            is_const: symbol.is_const,
            is_export: symbol.is_export,
            location: decl.location.to_owned(),
        },
        warnings: builder.warnings,
        requests: builder.requests,
    })
}

/// `identity<u64>` for an instantiation, the plain name otherwise.
pub fn mangled_name(name: &str, type_args: &[Type]) -> String {
    if type_args.is_empty() {
        return name.to_owned();
    }

    let args: Vec<String> = type_args.iter().map(Type::to_string).collect();
    format!("{name}<{}>", args.join(", "))
}
