use crate::compiler_frontend::compiler_errors::{
    CompilerError, CompilerMessages, ErrorType, error_type_to_str,
};
use crate::compiler_frontend::compiler_warnings::print_formatted_warning;
use saying::say;
use std::env;
use std::path::{Path, PathBuf};

fn normalize_display_path(path: &Path) -> PathBuf {
    let path_string = path.to_string_lossy();
    if let Some(stripped) = path_string.strip_prefix(r"\\?\") {
        return PathBuf::from(stripped);
    }

    path.to_path_buf()
}

fn relative_display_path(scope: &Path) -> String {
    let normalized_scope = normalize_display_path(scope);

    match env::current_dir() {
        Ok(dir) => {
            let normalized_dir = normalize_display_path(&dir);
            normalized_scope
                .strip_prefix(&normalized_dir)
                .unwrap_or(&normalized_scope)
                .to_string_lossy()
                .to_string()
        }
        Err(_) => normalized_scope.to_string_lossy().to_string(),
    }
}

pub fn print_compiler_messages(messages: CompilerMessages, show_warnings: bool) {
    for err in messages.errors {
        print_formatted_error(err);
    }

    if show_warnings {
        for warning in messages.warnings {
            print_formatted_warning(warning);
        }
    }
}

pub fn print_formatted_error(e: CompilerError) {
    let relative_dir = relative_display_path(&e.location.scope);
    let start = &e.location.start_pos;
    let position = format!("{}:{}", start.line_number + 1, start.char_column + 1);

    match e.error_type {
        ErrorType::Type => {
            if !relative_dir.is_empty() {
                say!("\n(ಠ_ಠ) ", Dark Magenta relative_dir);
            }
            say!(Red "Type Error ", Dark Magenta position);
        }

        ErrorType::Rule => {
            if !relative_dir.is_empty() {
                say!("\nヽ(˶°o°)ﾉ  🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥  ╰(°□°╰) ");
            }
            say!(Red "Rule ", Dark Magenta position);
        }

        ErrorType::File => {
            say!(Yellow "🏚 Can't read ", relative_dir);
            say!(e.msg);
            return;
        }

        ErrorType::Config => {
            say!(Yellow "CONFIG FILE ISSUE - ", Dark Magenta relative_dir);
        }

        // Both of these mean the checked HIR reached a state analysis should have rejected
        ErrorType::Compiler | ErrorType::WasmGeneration => {
            let stage = error_type_to_str(&e.error_type);
            say!(Yellow stage, " - ");
            say!(Dark Yellow "possum developer skill issue (not your fault)");
        }
    }

    say!(Red e.msg);

    // HashMap order changes between runs
    let mut details: Vec<_> = e.metadata.iter().collect();
    details.sort_by_key(|(key, _)| format!("{key:?}"));
    for (key, value) in details {
        say!(Dark "  ", format!("{key:?}"), ": ", value.to_owned());
    }
}
