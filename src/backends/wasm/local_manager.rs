//! Local Variable Manager
//!
//! Maps HIR parameters to WASM locals and hands out scratch locals while a body is lowered.
//!
//! WASM local space layout:
//! - Index 0: the result pointer, for functions returning a compound value
//! - Then every parameter that has a stack value, in declaration order
//! - Then scratch locals, in allocation order

use crate::backends::wasm::memory_layout::WasmSignature;
use crate::compiler_frontend::hir::hir_nodes::LocalId;
use wasm_encoder::ValType;

pub struct LocalManager {
    // HIR parameter index -> WASM local index. None for unit parameters.
    param_indices: Vec<Option<u32>>,
    result_pointer: Option<u32>,
    parameter_count: u32,

    // Scratch locals after the parameters
    locals: Vec<ValType>,
}

impl LocalManager {
    pub fn new(signature: &WasmSignature) -> Self {
        let mut next_index = 0;

        let result_pointer = if signature.result_pointer {
            next_index += 1;
            Some(0)
        } else {
            None
        };

        let param_indices = signature
            .param_slots
            .iter()
            .copied()
            .map(|slot| {
                slot.map(|_| {
                    let index = next_index;
                    next_index += 1;
                    index
                })
            })
            .collect();

        LocalManager {
            param_indices,
            result_pointer,
            parameter_count: next_index,
            locals: Vec::new(),
        }
    }

    /// WASM index of a parameter, None if it has no stack value.
    pub fn param(&self, id: LocalId) -> Option<u32> {
        self.param_indices.get(id.0 as usize).copied().flatten()
    }

    pub fn result_pointer(&self) -> Option<u32> {
        self.result_pointer
    }

    pub fn allocate(&mut self, val_type: ValType) -> u32 {
        let index = self.parameter_count + self.locals.len() as u32;
        self.locals.push(val_type);
        index
    }

    /// Scratch locals as `(count, type)` runs, the format `Function::new` takes.
    /// Runs keep allocation order so indices handed out by [`LocalManager::allocate`] stay valid.
    pub fn wasm_locals(&self) -> Vec<(u32, ValType)> {
        let mut runs: Vec<(u32, ValType)> = Vec::new();
        for &val_type in &self.locals {
            match runs.last_mut() {
                Some((count, last)) if *last == val_type => *count += 1,
                _ => runs.push((1, val_type)),
            }
        }

        runs
    }
}

#[cfg(test)]
#[path = "tests/local_manager_tests.rs"]
mod tests;
