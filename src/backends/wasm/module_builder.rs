//! WASM Module Builder
//!
//! Collects sections while functions are lowered and writes them out in the order the
//! binary format requires: Type, Import, Function, Memory, Global, Export, Code.
//!
//! Indices are coordinated across sections. Imported functions always come before defined
//! ones, so every import has to be registered before the first call to [`WasmModuleBuilder::add_function`].

use crate::backends::wasm::error::WasmGenerationError;
use rustc_hash::{FxHashMap, FxHashSet};
use wasm_encoder::{
    CodeSection, ConstExpr, EntityType, ExportKind, ExportSection, Function, FunctionSection,
    GlobalSection, GlobalType, ImportSection, MemorySection, MemoryType, Module, TypeSection,
    ValType,
};

/// A registered function type, used for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

#[derive(Default)]
pub struct WasmModuleBuilder {
    type_section: TypeSection,
    import_section: ImportSection,
    function_section: FunctionSection,
    memory_section: MemorySection,
    global_section: GlobalSection,
    export_section: ExportSection,
    code_section: CodeSection,

    type_count: u32,
    function_count: u32,
    import_function_count: u32,
    global_count: u32,
    memory_count: u32,

    // FunctionType -> type index
    type_cache: FxHashMap<FunctionType, u32>,

    // Export names must be unique across every kind
    export_names: FxHashSet<String>,
}

impl WasmModuleBuilder {
    pub fn new() -> Self {
        WasmModuleBuilder::default()
    }

    // =========================================================================
    // Type Section
    // =========================================================================

    /// Adds a function type and returns its index.
    /// Identical signatures share one type entry.
    pub fn add_function_type(&mut self, params: Vec<ValType>, results: Vec<ValType>) -> u32 {
        let func_type = FunctionType { params, results };

        if let Some(&existing_index) = self.type_cache.get(&func_type) {
            return existing_index;
        }

        let type_index = self.type_count;
        self.type_section
            .ty()
            .function(func_type.params.iter().copied(), func_type.results.iter().copied());
        self.type_count += 1;
        self.type_cache.insert(func_type, type_index);

        type_index
    }

    // =========================================================================
    // Import Section
    // =========================================================================

    /// Adds an imported function and returns its function index.
    pub fn add_import_function(
        &mut self,
        module: &str,
        name: &str,
        type_idx: u32,
    ) -> Result<u32, WasmGenerationError> {
        if self.function_count > 0 {
            return Err(WasmGenerationError::section_ordering(
                "import",
                "function",
                format!("Import '{module}::{name}' was added after a defined function"),
            ));
        }

        let function_index = self.import_function_count;
        self.import_section
            .import(module, name, EntityType::Function(type_idx));
        self.import_function_count += 1;

        Ok(function_index)
    }

    // =========================================================================
    // Function and Code Sections
    // =========================================================================

    /// Adds a function declaration and its body.
    /// Returns the function index, which counts imports first.
    pub fn add_function(&mut self, type_idx: u32, body: &Function) -> u32 {
        let function_index = self.import_function_count + self.function_count;
        self.function_section.function(type_idx);
        self.code_section.function(body);
        self.function_count += 1;
        function_index
    }

    // =========================================================================
    // Memory Section
    // =========================================================================
    pub fn add_memory(&mut self, min_pages: u32, max_pages: Option<u32>) -> u32 {
        let memory_index = self.memory_count;
        self.memory_section.memory(MemoryType {
            minimum: min_pages as u64,
            maximum: max_pages.map(|pages| pages as u64),
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        self.memory_count += 1;
        memory_index
    }

    // =========================================================================
    // Global Section
    // =========================================================================
    pub fn add_global_i32(&mut self, initial_value: i32, mutable: bool) -> u32 {
        let global_index = self.global_count;
        self.global_section.global(
            GlobalType {
                val_type: ValType::I32,
                mutable,
                shared: false,
            },
            &ConstExpr::i32_const(initial_value),
        );
        self.global_count += 1;
        global_index
    }

    // =========================================================================
    // Export Section
    // =========================================================================
    pub fn add_export(
        &mut self,
        name: &str,
        kind: ExportKind,
        index: u32,
    ) -> Result<(), WasmGenerationError> {
        if !self.export_names.insert(name.to_owned()) {
            return Err(WasmGenerationError::export_error(
                name,
                "an export with this name already exists",
            ));
        }

        self.export_section.export(name, kind, index);
        Ok(())
    }

    pub fn add_function_export(
        &mut self,
        export_name: &str,
        function_index: u32,
    ) -> Result<(), WasmGenerationError> {
        if function_index >= self.total_function_count() {
            return Err(WasmGenerationError::export_error(
                export_name,
                format!("function index {function_index} doesn't exist"),
            ));
        }

        self.add_export(export_name, ExportKind::Func, function_index)
    }

    pub fn add_memory_export(
        &mut self,
        export_name: &str,
        memory_index: u32,
    ) -> Result<(), WasmGenerationError> {
        if memory_index >= self.memory_count {
            return Err(WasmGenerationError::export_error(
                export_name,
                format!("memory index {memory_index} doesn't exist"),
            ));
        }

        self.add_export(export_name, ExportKind::Memory, memory_index)
    }

    // =========================================================================
    // Index Accessors
    // =========================================================================
    pub fn total_function_count(&self) -> u32 {
        self.import_function_count + self.function_count
    }

    pub fn import_function_count(&self) -> u32 {
        self.import_function_count
    }

    pub fn type_count(&self) -> u32 {
        self.type_count
    }

    /// Writes every non-empty section in binary order.
    pub fn finish(self) -> Vec<u8> {
        let mut module = Module::new();

        if self.type_count > 0 {
            module.section(&self.type_section);
        }

        if self.import_function_count > 0 {
            module.section(&self.import_section);
        }

        if self.function_count > 0 {
            module.section(&self.function_section);
        }

        if self.memory_count > 0 {
            module.section(&self.memory_section);
        }

        if self.global_count > 0 {
            module.section(&self.global_section);
        }

        if !self.export_names.is_empty() {
            module.section(&self.export_section);
        }

        if self.function_count > 0 {
            module.section(&self.code_section);
        }

        module.finish()
    }
}

#[cfg(test)]
#[path = "tests/module_builder_tests.rs"]
mod tests;
