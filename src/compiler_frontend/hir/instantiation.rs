//! Module level HIR construction and monomorphization.
//!
//! Every non-generic local function is a root. Roots are checked first, then every generic
//! instantiation their bodies ask for, then every instantiation those ask for, one wave at a
//! time. Functions in a wave don't depend on each other, so a wave can be checked in parallel.
//! Results are merged back in wave order, so the output never depends on scheduling.

use crate::compiler_frontend::ast::ast_nodes::{Module, TextLocation};
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages, ErrorKind};
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::hir::hir_builder::{LoweredFunction, lower_function, mangled_name};
use crate::compiler_frontend::hir::hir_nodes::{FunctionRef, HirModule};
use crate::compiler_frontend::symbol_table::{FunctionOrigin, SymbolTable};
use crate::projects::settings::Config;
use crate::{hir_log, return_compiler_error};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

struct Job {
    target: FunctionRef,
    depth: usize,
    location: TextLocation,
}

pub fn build_hir_module(
    module: &Module,
    symbols: &SymbolTable,
    config: &Config,
) -> Result<(HirModule, Vec<CompilerWarning>), CompilerMessages> {
    let mut seen: FxHashSet<FunctionRef> = FxHashSet::default();
    let mut wave = Vec::new();

    for symbol in symbols.functions() {
        if matches!(symbol.origin, FunctionOrigin::Local { .. }) && !symbol.signature.is_generic() {
            let target = FunctionRef::plain(symbol.id);
            seen.insert(target.to_owned());
            wave.push(Job {
                target,
                depth: 0,
                location: symbol.location.to_owned(),
            });
        }
    }

    let mut functions = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    while !wave.is_empty() {
        hir_log!("Checking a wave of ", Bright wave.len(), " functions");

        let results: Vec<Result<LoweredFunction, CompilerError>> = if config.parallel {
            wave.par_iter()
                .map(|job| lower_job(module, symbols, job))
                .collect()
        } else {
            wave.iter()
                .map(|job| lower_job(module, symbols, job))
                .collect()
        };

        let mut next_wave = Vec::new();
        for (job, result) in wave.iter().zip(results) {
            let lowered = match result {
                Ok(lowered) => lowered,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            warnings.extend(lowered.warnings);

            for request in lowered.requests {
                if !seen.insert(request.target.to_owned()) {
                    continue;
                }

                let depth = job.depth + 1;
                if depth > config.max_instantiation_depth {
                    errors.push(instantiation_limit(symbols, &request.target, depth, &request.location));
                    continue;
                }

                next_wave.push(Job {
                    target: request.target,
                    depth,
                    location: request.location,
                });
            }

            functions.push(lowered.function);
        }

        wave = next_wave;
    }

    for symbol in symbols.functions() {
        let is_local = matches!(symbol.origin, FunctionOrigin::Local { .. });
        if !is_local || !symbol.signature.is_generic() {
            continue;
        }

        if !seen.iter().any(|target| target.id == symbol.id) {
            warnings.push(CompilerWarning::new(
                &format!(
                    "'{}' is never called with concrete types, so its body was not checked",
                    symbol.name
                ),
                symbol.location.to_owned(),
                WarningKind::UninstantiatedGeneric,
            ));
        }
    }

    if !errors.is_empty() {
        return Err(CompilerMessages::from_errors(errors, warnings));
    }

    Ok((HirModule { functions }, warnings))
}

fn lower_job(
    module: &Module,
    symbols: &SymbolTable,
    job: &Job,
) -> Result<LoweredFunction, CompilerError> {
    let symbol = symbols.function(job.target.id);

    let FunctionOrigin::Local { decl_index } = &symbol.origin else {
        return_compiler_error!(format!(
            "Imported function '{}' was scheduled for body checking",
            symbol.name
        ))
    };

    let Some(decl) = module.functions.get(*decl_index) else {
        return_compiler_error!(format!(
            "Function '{}' points at declaration {decl_index}, which doesn't exist",
            symbol.name
        ))
    };

    lower_function(symbols, decl, symbol, &job.target.type_args).map_err(|mut e| {
        if !job.target.type_args.is_empty() && e.location == TextLocation::default() {
            e.location = job.location.to_owned();
        }
        e
    })
}

fn instantiation_limit(
    symbols: &SymbolTable,
    target: &FunctionRef,
    depth: usize,
    location: &TextLocation,
) -> CompilerError {
    let name = mangled_name(&symbols.function(target.id).name, &target.type_args);

    CompilerError::new(
        ErrorKind::InstantiationLimit {
            name: name.to_owned(),
            depth,
        },
        format!("Instantiating '{name}' needs {depth} nested instantiations, which is too many"),
        location.to_owned(),
    )
}

#[cfg(test)]
#[path = "tests/instantiation_tests.rs"]
mod tests;
