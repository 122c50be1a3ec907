//! Validates finished modules with wasmparser.
//!
//! Every module the compiler hands out has already passed validation, so a failure here is
//! always a codegen bug and is reported as one.

use crate::backends::wasm::error::WasmGenerationError;
use crate::codegen_log;

pub fn validate_wasm_module(wasm_bytes: &[u8]) -> Result<(), WasmGenerationError> {
    match wasmparser::validate(wasm_bytes) {
        Ok(_) => {
            codegen_log!(Green "Module validated, ", Bright wasm_bytes.len(), " bytes");
            Ok(())
        }
        Err(e) => Err(WasmGenerationError::from_wasmparser_error(&e)),
    }
}
