pub mod ast_nodes;
