/// # Built-in tooling around the compiler core
/// The CLI reads a module handed over by the external parser, the settings decide how it is compiled.

// The basic compiler CLI
pub mod cli;
pub mod settings;
