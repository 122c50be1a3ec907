use crate::compiler_frontend::ast::ast_nodes::TextLocation;
use saying::say;

#[derive(Clone, Debug, PartialEq)]
pub struct CompilerWarning {
    pub msg: String,
    pub location: TextLocation,
    pub warning_kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(msg: &str, location: TextLocation, warning_kind: WarningKind) -> CompilerWarning {
        CompilerWarning {
            msg: msg.to_owned(),
            location,
            warning_kind,
        }
    }

    /// Get the file path as a string for display purposes
    pub fn file_path_string(&self) -> String {
        self.location.scope.to_string_lossy().to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    // An alternative inside a reachable arm that earlier arms already cover
    RedundantPattern,

    // A generic function nothing instantiates, so its body was never checked
    UninstantiatedGeneric,
}

pub fn print_formatted_warning(w: CompilerWarning) {
    say!(Yellow Bold "WARNING: ");
    let line_number = w.location.start_pos.line_number + 1;
    say!("File: ", w.file_path_string(), " line ", line_number);
    match w.warning_kind {
        WarningKind::RedundantPattern => {
            say!("Redundant pattern ", Yellow w.msg);
        }
        WarningKind::UninstantiatedGeneric => {
            say!("Generic function never instantiated ", Yellow w.msg);
        }
    }
}
