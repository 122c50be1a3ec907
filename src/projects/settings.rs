//! Compiler configuration, read from a `possum.toml` next to the module being built.
//!
//! Every field is optional. A missing file is the same as an empty one.

use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind, ErrorMetaDataKey};
use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "possum.toml";
pub const WASM_FILE_EXTENSION: &str = "wasm";
pub const WASM_PAGE_SIZE: u32 = 65536;

// 64 KiB of shadow stack unless the config says otherwise
pub const DEFAULT_STACK_SIZE: u32 = WASM_PAGE_SIZE;
pub const DEFAULT_MAX_MEMORY_PAGES: u32 = 16;
pub const DEFAULT_MAX_INSTANTIATION_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // Stem of the .wasm file `build` writes when no -o is given. Unset uses the input's stem
    pub module_name: Option<String>,

    // Bytes reserved at the bottom of memory for the shadow stack
    pub stack_size: u32,
    pub max_memory_pages: u32,
    pub export_memory: bool,

    // Check and lower independent functions on the rayon thread pool
    pub parallel: bool,

    // Replace calls to const functions with their folded literal
    pub fold_const_calls: bool,
    pub validate_output: bool,
    pub max_instantiation_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            module_name: None,
            stack_size: DEFAULT_STACK_SIZE,
            max_memory_pages: DEFAULT_MAX_MEMORY_PAGES,
            export_memory: true,
            parallel: true,
            fold_const_calls: true,
            validate_output: true,
            max_instantiation_depth: DEFAULT_MAX_INSTANTIATION_DEPTH,
        }
    }
}

impl Config {
    /// Where `build` writes the module for `input` when no output path is given.
    pub fn default_output_path(&self, input: &Path) -> PathBuf {
        match &self.module_name {
            Some(name) => input.with_file_name(format!("{name}.{WASM_FILE_EXTENSION}")),
            None => input.with_extension(WASM_FILE_EXTENSION),
        }
    }

    pub fn from_toml(source: &str, path: &Path) -> Result<Config, CompilerError> {
        let config: Config = toml::from_str(source).map_err(|e| config_error(path, e.message()))?;

        if let Some(name) = &config.module_name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(config_error(path, "module_name must be a plain file name"));
            }
        }

        if config.stack_size == 0 {
            return Err(config_error(path, "stack_size must be greater than zero"));
        }

        // The stack top is 8 byte aligned and must still be a 32 bit address
        if config.stack_size.checked_next_multiple_of(8).is_none() {
            return Err(config_error(path, "stack_size must fit in 32 bit linear memory"));
        }

        if config.max_memory_pages > WASM_MAX_PAGES {
            return Err(config_error(
                path,
                &format!("max_memory_pages can be at most {WASM_MAX_PAGES}"),
            ));
        }

        Ok(config)
    }

    /// Loads a config file. A file that doesn't exist gives the defaults.
    pub fn load(path: &Path) -> Result<Config, CompilerError> {
        match fs::read_to_string(path) {
            Ok(source) => Config::from_toml(&source, path),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(CompilerError::file_error(
                path,
                format!("Couldn't read config file: {e}"),
            )),
        }
    }
}

// 4 GiB of 32 bit linear memory
const WASM_MAX_PAGES: u32 = 65536;

fn config_error(path: &Path, msg: &str) -> CompilerError {
    CompilerError::new(
        ErrorKind::Config,
        format!("Invalid {CONFIG_FILE_NAME}: {msg}"),
        TextLocation {
            scope: path.to_path_buf(),
            ..TextLocation::default()
        },
    )
    .with_metadata(ErrorMetaDataKey::CompilationStage, "Config")
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
