//! possum: semantic analysis and WebAssembly code generation for the possum language.
//!
//! The external parser hands over a [`compiler_frontend::ast::ast_nodes::Module`]; the
//! frontend resolves and checks it, and the WASM backend turns the checked HIR into one
//! validated module.

pub mod backends;
pub mod compiler_frontend;
pub mod projects;

pub use compiler_frontend::{CompiledModule, CompilerFrontend, Flag, compile_module};
