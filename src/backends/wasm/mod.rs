//! # WASM Codegen
//!
//! Lowers a checked HIR module into one WebAssembly module using wasm_encoder, and validates
//! the result with wasmparser.
//!
//! ```text
//! HIR Module -> Signatures -> Function Lowering -> Module Builder -> Validation -> WASM Bytes
//! ```
//!
//! ## Core Components
//!
//! - `memory_layout`: stack and heap representation of every type, packed compound layouts
//! - `local_manager`: parameter to WASM local mapping and scratch locals
//! - `function_lowerer`: HIR expressions to instructions, frames on the shadow stack
//! - `module_builder`: section ordering, index coordination and type deduplication
//! - `encode`: the entry point tying the above together
//! - `validator`: wasmparser validation of the finished bytes
//!
//! Lifetimes and generics never reach this stage. Every function here is concrete.

pub mod encode;
pub mod error;
pub mod function_lowerer;
pub mod local_manager;
pub mod memory_layout;
pub mod module_builder;
pub mod validator;
