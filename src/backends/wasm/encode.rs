//! WASM Codegen Encoder
//!
//! Main entry point for turning a checked HIR module into WASM bytes.
//!
//! ## Encoding Pipeline
//!
//! 1. Collect the imported functions the module actually calls, in first-use order
//! 2. Register imports, then give every HIR function its index
//! 3. Lower every function body (in parallel when the config allows it)
//! 4. Size the memory for the stack region and the largest frame
//! 5. Add the stack pointer global, the functions and the exports
//! 6. Validate and finish the module

use crate::backends::wasm::error::WasmGenerationError;
use crate::backends::wasm::function_lowerer::{
    CodegenContext, LoweredBody, align_to, lower_function,
};
use crate::backends::wasm::memory_layout::{MemoryLayout, NamedTypeLayout, WasmSignature};
use crate::backends::wasm::module_builder::WasmModuleBuilder;
use crate::backends::wasm::validator::validate_wasm_module;
use crate::codegen_log;
use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind};
use crate::compiler_frontend::hir::hir_nodes::{
    Expression, ExpressionKind, FunctionRef, HirFunction, HirModule,
};
use crate::compiler_frontend::symbol_table::{FunctionOrigin, SymbolTable};
use crate::projects::settings::{Config, WASM_PAGE_SIZE};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use wasm_encoder::ValType;

pub const STACK_POINTER_NAME: &str = "__stack_pointer";
pub const MEMORY_EXPORT_NAME: &str = "memory";

/// A finished, validated module.
#[derive(Debug, Clone)]
pub struct EncodedModule {
    pub bytes: Vec<u8>,

    // Export names in the order they were added
    pub exports: Vec<String>,

    // Every defined function, in function index order after the imports
    pub function_types: Vec<FunctionSignatureInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignatureInfo {
    pub name: String,
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

pub fn encode_wasm(
    hir: &HirModule,
    symbols: &SymbolTable,
    config: &Config,
    named_layouts: &dyn NamedTypeLayout,
) -> Result<EncodedModule, Vec<CompilerError>> {
    let layout = MemoryLayout::new(named_layouts);
    let mut builder = WasmModuleBuilder::new();
    let mut function_indices: FxHashMap<FunctionRef, u32> = FxHashMap::default();

    // Imports come first in the function index space
    for target in referenced_imports(hir, symbols) {
        let symbol = symbols.function(target.id);
        let FunctionOrigin::Imported { module_path } = &symbol.origin else {
            continue;
        };

        let signature = layout
            .signature(&symbol.signature.params, &symbol.signature.return_type)
            .map_err(|e| vec![e.to_compiler_error(symbol.location.to_owned())])?;
        let type_idx = builder.add_function_type(signature.params, signature.results);
        let index = builder
            .add_import_function(module_path, &symbol.name, type_idx)
            .map_err(|e| vec![e.to_compiler_error(symbol.location.to_owned())])?;

        codegen_log!("Imported ", Blue symbol.name, " from ", Blue module_path);
        function_indices.insert(target, index);
    }

    let mut signatures = Vec::with_capacity(hir.functions.len());
    let mut errors = Vec::new();
    for (offset, function) in hir.functions.iter().enumerate() {
        let params: Vec<_> = function
            .params
            .iter()
            .map(|param| param.data_type.to_owned())
            .collect();

        match layout.signature(&params, &function.return_type) {
            Ok(signature) => signatures.push(signature),
            Err(e) => errors.push(e.to_compiler_error(function.location.to_owned())),
        }

        let index = builder.import_function_count() + offset as u32;
        function_indices.insert(function.symbol.to_owned(), index);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // Globals are only added below, but nothing else claims index 0
    let ctx = CodegenContext {
        layout: &layout,
        function_indices: &function_indices,
        stack_pointer: 0,
    };

    let lower = |(function, signature): (&HirFunction, &WasmSignature)| {
        lower_function(&ctx, function, signature)
            .map_err(|e| e.to_compiler_error(function.location.to_owned()))
    };

    let results: Vec<Result<LoweredBody, CompilerError>> = if config.parallel {
        hir.functions
            .par_iter()
            .zip(signatures.par_iter())
            .map(lower)
            .collect()
    } else {
        hir.functions.iter().zip(signatures.iter()).map(lower).collect()
    };

    let mut bodies = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(body) => bodies.push(body),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // Memory and the stack pointer
    let largest_frame = bodies.iter().map(|body| body.frame_size).max().unwrap_or(0);
    let Some(stack_top) = align_to(config.stack_size.max(largest_frame), 8) else {
        return Err(vec![CompilerError::new(
            ErrorKind::Config,
            format!("stack_size {} leaves no room to align the stack", config.stack_size),
            TextLocation::default(),
        )]);
    };
    let min_pages = stack_top.div_ceil(WASM_PAGE_SIZE).max(1);
    let max_pages = config.max_memory_pages.max(min_pages);

    let memory_index = builder.add_memory(min_pages, Some(max_pages));
    let stack_pointer = builder.add_global_i32(stack_top as i32, true);
    if stack_pointer != ctx.stack_pointer {
        return Err(vec![compiler_bug(format!(
            "{STACK_POINTER_NAME} was added as global {stack_pointer}"
        ))]);
    }

    codegen_log!(
        "Stack region is ", Bright stack_top, " bytes over ", Bright min_pages, " pages"
    );

    let mut function_types = Vec::with_capacity(bodies.len());
    for ((function, signature), body) in hir.functions.iter().zip(signatures).zip(bodies) {
        let type_idx =
            builder.add_function_type(signature.params.to_owned(), signature.results.to_owned());
        builder.add_function(type_idx, &body.function);

        function_types.push(FunctionSignatureInfo {
            name: function.name.to_owned(),
            params: signature.params,
            results: signature.results,
        });
    }

    // Exports
    let mut exports = Vec::new();
    for function in hir.functions.iter().filter(|function| function.is_export) {
        let Some(&index) = function_indices.get(&function.symbol) else {
            return Err(vec![compiler_bug(format!(
                "Exported function '{}' has no function index",
                function.name
            ))]);
        };

        builder
            .add_function_export(&function.name, index)
            .map_err(|e| vec![e.to_compiler_error(function.location.to_owned())])?;
        exports.push(function.name.to_owned());
    }

    if config.export_memory {
        builder
            .add_memory_export(MEMORY_EXPORT_NAME, memory_index)
            .map_err(|e| vec![e.to_compiler_error(TextLocation::default())])?;
        exports.push(MEMORY_EXPORT_NAME.to_owned());
    }

    let bytes = builder.finish();

    if config.validate_output {
        validate_wasm_module(&bytes).map_err(|e| vec![e.to_compiler_error(TextLocation::default())])?;
    }

    Ok(EncodedModule {
        bytes,
        exports,
        function_types,
    })
}

/// Imported functions some body calls, in the order they are first called.
fn referenced_imports(hir: &HirModule, symbols: &SymbolTable) -> Vec<FunctionRef> {
    let mut calls = Vec::new();
    for function in &hir.functions {
        collect_calls(&function.body, &mut calls);
    }

    let mut seen = FxHashSet::default();
    calls
        .into_iter()
        .filter(|target| {
            matches!(
                symbols.function(target.id).origin,
                FunctionOrigin::Imported { .. }
            )
        })
        .filter(|target| seen.insert(target.to_owned()))
        .collect()
}

fn collect_calls(expression: &Expression, calls: &mut Vec<FunctionRef>) {
    match &expression.kind {
        ExpressionKind::Call(call) => {
            calls.push(call.target.to_owned());
            for arg in &call.args {
                collect_calls(&arg.value, calls);
            }
        }
        ExpressionKind::Tuple(elements)
        | ExpressionKind::Array(elements)
        | ExpressionKind::Block {
            expressions: elements,
            ..
        } => {
            for element in elements {
                collect_calls(element, calls);
            }
        }
        ExpressionKind::Cast { value, .. }
        | ExpressionKind::Reference(value)
        | ExpressionKind::Dereference(value) => collect_calls(value, calls),
        ExpressionKind::Unary { operand, .. } => collect_calls(operand, calls),
        ExpressionKind::Binary { lhs, rhs, .. } => {
            collect_calls(lhs, calls);
            collect_calls(rhs, calls);
        }
        ExpressionKind::Match(hir_match) => {
            collect_calls(&hir_match.scrutinee, calls);
            for arm in &hir_match.arms {
                collect_calls(arm, calls);
            }
        }
        ExpressionKind::Int(_)
        | ExpressionKind::Float(_)
        | ExpressionKind::Bool(_)
        | ExpressionKind::Local(_) => {}
    }
}

fn compiler_bug(msg: String) -> CompilerError {
    WasmGenerationError::instruction_lowering("module", msg).to_compiler_error(TextLocation::default())
}

#[cfg(test)]
#[path = "tests/encode_tests.rs"]
mod tests;
