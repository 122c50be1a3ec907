use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::datatypes::Type;
use std::collections::HashMap;
use std::fmt;

// The final set of errors and warnings emitted from the compiler
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

impl CompilerMessages {
    pub fn new() -> Self {
        CompilerMessages {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<CompilerError>, warnings: Vec<CompilerWarning>) -> Self {
        CompilerMessages { errors, warnings }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl From<CompilerError> for CompilerMessages {
    fn from(error: CompilerError) -> Self {
        CompilerMessages {
            errors: vec![error],
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Eq, Hash, PartialEq, Clone, Copy)]
pub enum ErrorMetaDataKey {
    VariableName,
    FunctionName,
    CompilationStage,

    // Optional suggestions
    PrimarySuggestion,
    AlternativeSuggestion,

    // Data type information
    ExpectedType,
    FoundType,
    InferredType,
}

/// What went wrong, with the types and names involved.
/// Tools match on this; `msg` is only for people.
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    UnknownIdentifier {
        name: String,
    },
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    InvalidArrayLength {
        reason: String,
    },
    IllegalCast {
        from: Type,
        to: Type,
    },
    ImplicitCastNotAllowed {
        from: Type,
        to: Type,
    },
    AmbiguousCall {
        name: String,
        candidates: usize,
    },
    NoMatchingFunction {
        name: String,
    },
    DivisionByZero,
    NonExhaustiveMatch {
        missing_representative: String,
    },
    UnreachableArm {
        index: usize,
    },
    ReturnTypeMismatch {
        expected: Type,
        found: Type,
    },
    TypeMismatch {
        expected: Type,
        found: Type,
    },
    DuplicateDefinition {
        name: String,
    },
    NonConstantOperand,
    InvalidOperator {
        operator: String,
        operand: Type,
    },
    LiteralOutOfRange {
        literal: String,
        kind: Type,
    },
    UnsupportedLiteral {
        literal: String,
    },
    UnsupportedType {
        ty: Type,
    },
    CannotInferType,
    InvalidExport {
        name: String,
    },
    InvalidImport {
        name: String,
    },
    InstantiationLimit {
        name: String,
        depth: usize,
    },
    WasmValidation,
    CompilerBug,
    Io,
    Config,
}

impl ErrorKind {
    /// The stage category a kind is reported under.
    pub fn error_type(&self) -> ErrorType {
        match self {
            ErrorKind::IllegalCast { .. }
            | ErrorKind::ImplicitCastNotAllowed { .. }
            | ErrorKind::ReturnTypeMismatch { .. }
            | ErrorKind::TypeMismatch { .. }
            | ErrorKind::InvalidOperator { .. }
            | ErrorKind::LiteralOutOfRange { .. }
            | ErrorKind::UnsupportedType { .. }
            | ErrorKind::CannotInferType
            | ErrorKind::NoMatchingFunction { .. }
            | ErrorKind::AmbiguousCall { .. } => ErrorType::Type,
            ErrorKind::WasmValidation => ErrorType::WasmGeneration,
            ErrorKind::CompilerBug => ErrorType::Compiler,
            ErrorKind::Io => ErrorType::File,
            ErrorKind::Config => ErrorType::Config,
            _ => ErrorType::Rule,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CompilerError {
    pub kind: ErrorKind,
    pub msg: String,
    pub location: TextLocation,
    pub error_type: ErrorType,

    // This is for creating more structured and detailed error messages
    pub metadata: HashMap<ErrorMetaDataKey, String>,
}

impl CompilerError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>, location: TextLocation) -> CompilerError {
        CompilerError {
            error_type: kind.error_type(),
            kind,
            msg: msg.into(),
            location,
            metadata: HashMap::new(),
        }
    }

    /// Create a compiler error (internal bug, not user's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        CompilerError {
            kind: ErrorKind::CompilerBug,
            msg: msg.into(),
            location: TextLocation::default(),
            error_type: ErrorType::Compiler,
            metadata: HashMap::new(),
        }
    }

    /// Create a file system error
    pub fn file_error(path: &std::path::Path, msg: impl Into<String>) -> Self {
        CompilerError {
            kind: ErrorKind::Io,
            msg: msg.into(),
            location: TextLocation {
                scope: path.to_path_buf(),
                ..TextLocation::default()
            },
            error_type: ErrorType::File,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: ErrorMetaDataKey, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }

    pub fn with_error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = error_type;
        self
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (line {}): {}",
            error_type_to_str(&self.error_type),
            self.location.start_pos.line_number + 1,
            self.msg
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorType {
    Type,
    Rule,
    File,
    Config,
    Compiler,
    WasmGeneration,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::Compiler => "Compiler Bug",
        ErrorType::Config => "Malformed Config",
        ErrorType::File => "File Error",
        ErrorType::Rule => "Language Rule Violation",
        ErrorType::Type => "Type Error",
        ErrorType::WasmGeneration => "WASM Generation",
    }
}

/// Returns a new CompilerError for type system violations.
///
/// Type errors indicate mismatched types or invalid type operations.
/// Should mention both expected and actual types when they are known.
///
/// Usage:
/// `return_type_error!(ErrorKind::TypeMismatch { .. }, "Arms must agree", location, { ExpectedType => "u64", FoundType => "s32" })`;
#[macro_export]
macro_rules! return_type_error {
    ($kind:expr, $msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            kind: $kind,
            msg: $msg.into(),
            location: ($location).clone(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Type,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key, ($value).to_string()); )*
                map
            },
        })
    };
    ($kind:expr, $msg:expr, $location:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            kind: $kind,
            msg: $msg.into(),
            location: ($location).clone(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Type,
            metadata: std::collections::HashMap::new(),
        })
    };
}

/// Returns a new CompilerError for language rule violations.
///
/// Rule errors are for code that is well typed but breaks a rule of the language,
/// like an unreachable match arm or a division by zero in a constant.
///
/// Usage:
/// `return_rule_error!(ErrorKind::DivisionByZero, "Can't divide by zero", location, { CompilationStage => "Constant Folding" })`;
#[macro_export]
macro_rules! return_rule_error {
    ($kind:expr, $msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            kind: $kind,
            msg: $msg.into(),
            location: ($location).clone(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Rule,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key, ($value).to_string()); )*
                map
            },
        })
    };
    ($kind:expr, $msg:expr, $location:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            kind: $kind,
            msg: $msg.into(),
            location: ($location).clone(),
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Rule,
            metadata: std::collections::HashMap::new(),
        })
    };
}

/// Returns a new CompilerError for internal compiler bugs.
/// These are never the user's fault, so there are no suggestions.
///
/// Usage:
/// `return_compiler_error!("Binary operator reached codegen unfolded")`;
#[macro_export]
macro_rules! return_compiler_error {
    ($msg:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::compiler_error(
            $msg,
        ))
    };
}
