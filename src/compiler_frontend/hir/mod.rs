pub mod call_desugaring;
pub mod hir_builder;
pub mod hir_expression;
pub mod hir_nodes;
pub mod instantiation;
