//! WASM generation errors.
//!
//! Anything that goes wrong while lowering HIR is either a deferred language feature
//! (a named type with no layout yet) or a bug in an earlier stage. Each variant converts
//! into a [`CompilerError`] carrying the stage that produced it.

use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorKind, ErrorMetaDataKey};
use crate::compiler_frontend::datatypes::Type;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum WasmGenerationError {
    /// A type has no WASM representation yet.
    UnsupportedType {
        ty: Type,
        context: String,
    },

    /// A HIR node reached codegen in a shape earlier stages should have removed.
    InstructionLowering {
        node: String,
        context: String,
    },

    /// Sections were added in an order the binary format doesn't allow.
    SectionOrdering {
        section: String,
        must_come_before: String,
        context: String,
    },

    ExportError {
        name: String,
        context: String,
    },

    /// wasmparser rejected the finished module.
    ValidationFailure {
        wasm_error: String,
        offset: usize,
        suggestion: String,
    },
}

impl WasmGenerationError {
    pub fn unsupported_type(ty: &Type, context: impl Into<String>) -> Self {
        WasmGenerationError::UnsupportedType {
            ty: ty.to_owned(),
            context: context.into(),
        }
    }

    pub fn instruction_lowering(node: impl Into<String>, context: impl Into<String>) -> Self {
        WasmGenerationError::InstructionLowering {
            node: node.into(),
            context: context.into(),
        }
    }

    pub fn section_ordering(
        section: impl Into<String>,
        must_come_before: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        WasmGenerationError::SectionOrdering {
            section: section.into(),
            must_come_before: must_come_before.into(),
            context: context.into(),
        }
    }

    pub fn export_error(name: impl Into<String>, context: impl Into<String>) -> Self {
        WasmGenerationError::ExportError {
            name: name.into(),
            context: context.into(),
        }
    }

    pub fn from_wasmparser_error(error: &wasmparser::BinaryReaderError) -> Self {
        let wasm_error = error.message().to_owned();
        let suggestion = suggest_fix_for_wasmparser_error(&wasm_error);

        WasmGenerationError::ValidationFailure {
            wasm_error,
            offset: error.offset(),
            suggestion: suggestion.to_owned(),
        }
    }

    pub fn to_compiler_error(self, location: TextLocation) -> CompilerError {
        match self {
            WasmGenerationError::UnsupportedType { ty, context } => CompilerError::new(
                ErrorKind::UnsupportedType { ty: ty.to_owned() },
                format!("'{ty}' can't be lowered to WASM yet ({context})"),
                location,
            )
            .with_metadata(ErrorMetaDataKey::CompilationStage, "WASM Generation")
            .with_metadata(ErrorMetaDataKey::FoundType, ty.to_string()),

            WasmGenerationError::InstructionLowering { node, context } => {
                CompilerError::compiler_error(format!("Can't lower {node} to WASM: {context}"))
                    .with_metadata(
                        ErrorMetaDataKey::CompilationStage,
                        "WASM Generation - Instruction Lowering",
                    )
            }

            WasmGenerationError::SectionOrdering {
                section,
                must_come_before,
                context,
            } => CompilerError::compiler_error(format!(
                "The {section} section must be built before the {must_come_before} section: {context}"
            ))
            .with_metadata(ErrorMetaDataKey::CompilationStage, "WASM Generation - Module Builder"),

            WasmGenerationError::ExportError { name, context } => {
                CompilerError::compiler_error(format!("Can't export '{name}': {context}"))
                    .with_metadata(ErrorMetaDataKey::CompilationStage, "WASM Generation - Exports")
            }

            WasmGenerationError::ValidationFailure {
                wasm_error,
                offset,
                suggestion,
            } => CompilerError::new(
                ErrorKind::WasmValidation,
                format!("Generated module failed validation at byte {offset}: {wasm_error}"),
                location,
            )
            .with_metadata(ErrorMetaDataKey::CompilationStage, "WASM Generation - Validation")
            .with_metadata(ErrorMetaDataKey::PrimarySuggestion, suggestion),
        }
    }
}

impl fmt::Display for WasmGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WasmGenerationError::UnsupportedType { ty, context } => {
                write!(f, "unsupported type '{ty}' in {context}")
            }
            WasmGenerationError::InstructionLowering { node, context } => {
                write!(f, "can't lower {node}: {context}")
            }
            WasmGenerationError::SectionOrdering {
                section,
                must_come_before,
                ..
            } => write!(f, "{section} section must come before {must_come_before}"),
            WasmGenerationError::ExportError { name, context } => {
                write!(f, "bad export '{name}': {context}")
            }
            WasmGenerationError::ValidationFailure { wasm_error, .. } => {
                write!(f, "validation failed: {wasm_error}")
            }
        }
    }
}

fn suggest_fix_for_wasmparser_error(error_msg: &str) -> &'static str {
    if error_msg.contains("type mismatch") {
        return "An operand's stack width disagrees with its instruction. Check the cast lowering for this type.";
    }

    if error_msg.contains("unknown function") || error_msg.contains("function index") {
        return "A call points at a function index that was never added to the module.";
    }

    if error_msg.contains("unknown memory") {
        return "A load or store was emitted before the module declared its memory.";
    }

    if error_msg.contains("unknown global") {
        return "The stack pointer global must be added before any function that reserves a frame.";
    }

    "Run with the show_codegen feature to see the lowered instructions."
}
