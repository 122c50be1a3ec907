pub mod ast;
pub mod analysis {
    pub mod match_compiler;
}
pub mod casts;
pub mod datatypes;
pub mod hir;
pub mod symbol_table;
pub mod type_resolver;

pub mod optimizers {
    pub mod const_call_folding;
    pub mod constant_folding;
}

pub mod compiler_messages {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;
    pub mod compiler_warnings;
    pub mod display_messages;
}
pub use compiler_messages::compiler_errors;
pub use compiler_messages::compiler_warnings;
pub use compiler_messages::display_messages;

#[cfg(test)]
#[path = "tests/test_support.rs"]
pub(crate) mod test_support;

use crate::backends::wasm::encode::{EncodedModule, FunctionSignatureInfo, encode_wasm};
use crate::backends::wasm::memory_layout::{DeferredNamedLayout, NamedTypeLayout};
use crate::compiler_frontend::ast::ast_nodes::Module;
use crate::compiler_frontend::compiler_errors::CompilerMessages;
use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::hir::hir_nodes::HirModule;
use crate::compiler_frontend::hir::instantiation::build_hir_module;
use crate::compiler_frontend::optimizers::const_call_folding::fold_const_calls;
use crate::compiler_frontend::symbol_table::SymbolTable;
use crate::projects::settings::Config;
use crate::timer_log;
use saying::say;
use std::time::Instant;

/// Flags change the behavior of the core compiler pipeline.
/// For the built-in CLI these are added as cli flags, but other tools can decide how to choose flags
#[derive(PartialEq, Debug, Clone)]
pub enum Flag {
    DisableWarnings,
    DisableTimers,
}

/// Everything a successful compilation produces.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub wasm_bytes: Vec<u8>,
    pub warnings: Vec<CompilerWarning>,
    pub exports: Vec<String>,
    pub function_types: Vec<FunctionSignatureInfo>,
}

pub struct CompilerFrontend<'a> {
    pub config: &'a Config,
    named_layouts: Box<dyn NamedTypeLayout>,
}

impl<'a> CompilerFrontend<'a> {
    pub fn new(config: &'a Config) -> Self {
        CompilerFrontend {
            config,
            named_layouts: Box::new(DeferredNamedLayout),
        }
    }

    /// Swaps in a layout for struct and enum types.
    pub fn with_named_layouts(mut self, named_layouts: Box<dyn NamedTypeLayout>) -> Self {
        self.named_layouts = named_layouts;
        self
    }

    /// -----------------------------
    /// SYMBOL TABLE
    /// -----------------------------
    /// Every signature in the module is resolved before any body is checked.
    /// No body can be checked if any of these fail, so every error found is returned at once.
    pub fn build_symbols(&self, module: &Module) -> Result<SymbolTable, CompilerMessages> {
        SymbolTable::build(module).map_err(|errors| CompilerMessages::from_errors(errors, Vec::new()))
    }

    /// -----------------------------
    /// HIR GENERATION
    /// -----------------------------
    /// Type checks every function body, desugars calls and monomorphizes generics.
    /// A failing function doesn't stop its siblings, so every function's first error is reported.
    pub fn generate_hir(
        &self,
        module: &Module,
        symbols: &SymbolTable,
    ) -> Result<(HirModule, Vec<CompilerWarning>), CompilerMessages> {
        build_hir_module(module, symbols, self.config)
    }

    /// -----------------------------
    /// CONST CALL FOLDING
    /// -----------------------------
    pub fn fold_const_calls(&self, hir: HirModule) -> Result<HirModule, CompilerMessages> {
        if !self.config.fold_const_calls {
            return Ok(hir);
        }

        fold_const_calls(hir).map_err(CompilerMessages::from)
    }

    /// -----------------------------
    /// WASM GENERATION
    /// -----------------------------
    pub fn generate_wasm(
        &self,
        hir: &HirModule,
        symbols: &SymbolTable,
    ) -> Result<EncodedModule, CompilerMessages> {
        encode_wasm(hir, symbols, self.config, self.named_layouts.as_ref())
            .map_err(|errors| CompilerMessages::from_errors(errors, Vec::new()))
    }
}

/// Runs the whole pipeline on one module.
///
/// Any error anywhere means no WASM is produced. Warnings collected before the failure are
/// returned alongside the errors.
pub fn compile_module(
    module: &Module,
    config: &Config,
    flags: &[Flag],
) -> Result<CompiledModule, CompilerMessages> {
    let show_timers = !flags.contains(&Flag::DisableTimers);
    let frontend = CompilerFrontend::new(config);

    let time = Instant::now();
    let symbols = frontend.build_symbols(module)?;
    timer_log!(time, "Symbol table built in: ");

    let (hir, warnings) = frontend.generate_hir(module, &symbols)?;
    timer_log!(time, "HIR generated in: ");

    let hir = frontend.fold_const_calls(hir).map_err(|mut messages| {
        messages.warnings.extend(warnings.iter().cloned());
        messages
    })?;

    let encoded = frontend.generate_wasm(&hir, &symbols).map_err(|mut messages| {
        messages.warnings.extend(warnings.iter().cloned());
        messages
    })?;

    if show_timers {
        let path = &module.path;
        say!("Module ", Blue path, " compiled in: ", Green #time.elapsed());
    }

    let warnings = if flags.contains(&Flag::DisableWarnings) {
        Vec::new()
    } else {
        warnings
    };

    Ok(CompiledModule {
        wasm_bytes: encoded.bytes,
        warnings,
        exports: encoded.exports,
        function_types: encoded.function_types,
    })
}
