//! Command-line entrypoint for the possum compiler.
//!
//! Parsing source text is the job of a separate tool. This CLI reads the module it produced
//! as JSON, compiles it, and writes the WASM module next to it.

use crate::compiler_frontend::ast::ast_nodes::Module;
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::display_messages::print_compiler_messages;
use crate::compiler_frontend::{Flag, compile_module};
use crate::projects::settings::{CONFIG_FILE_NAME, Config};
use saying::say;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    // Compiles a module and writes the WASM file
    Build {
        input: PathBuf,
        output: Option<PathBuf>,
        config: Option<PathBuf>,
    },

    // Compiles a module without writing anything
    Check {
        input: PathBuf,
        config: Option<PathBuf>,
    },

    Help,
}

pub fn start_cli() {
    let compiler_args: Vec<String> = env::args().collect();

    if compiler_args.len() < 2 {
        print_help(false);
        return;
    }

    let command = match get_command(&compiler_args[1..]) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return;
        }
    };

    // Gather a list of any additional flags
    let flags = get_flags(&compiler_args);
    let show_warnings = !flags.contains(&Flag::DisableWarnings);

    match command {
        Command::Help => print_help(true),

        Command::Build {
            input,
            output,
            config,
        } => {
            match build(&input, output.as_deref(), config.as_deref(), &flags) {
                Ok((output, messages)) => {
                    say!(Green "Wrote ", output.to_string_lossy().to_string());
                    print_compiler_messages(messages, show_warnings);
                }
                Err(messages) => print_compiler_messages(messages, show_warnings),
            }
        }

        Command::Check { input, config } => {
            match compile(&input, config.as_deref(), &flags) {
                Ok((_, messages)) => {
                    say!(Green "No errors found in ", input.to_string_lossy().to_string());
                    print_compiler_messages(messages, show_warnings);
                }
                Err(messages) => print_compiler_messages(messages, show_warnings),
            }
        }
    }
}

/// Compiles `input` and writes the module to `output`, or to the config's default path.
/// On success the path written and any warnings are returned.
fn build(
    input: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    flags: &[Flag],
) -> Result<(PathBuf, CompilerMessages), CompilerMessages> {
    let config = load_config(input, config)?;
    let (wasm_bytes, messages) = compile_with(input, &config, flags)?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => config.default_output_path(input),
    };

    fs::write(&output, wasm_bytes).map_err(|e| {
        CompilerMessages::from(CompilerError::file_error(
            &output,
            format!("Couldn't write the WASM module: {e}"),
        ))
    })?;

    Ok((output, messages))
}

fn compile(
    input: &Path,
    config: Option<&Path>,
    flags: &[Flag],
) -> Result<(Vec<u8>, CompilerMessages), CompilerMessages> {
    let config = load_config(input, config)?;
    compile_with(input, &config, flags)
}

fn load_config(input: &Path, config: Option<&Path>) -> Result<Config, CompilerError> {
    let config_path = match config {
        Some(path) => path.to_path_buf(),
        None => default_config_path(input),
    };
    Config::load(&config_path)
}

fn compile_with(
    input: &Path,
    config: &Config,
    flags: &[Flag],
) -> Result<(Vec<u8>, CompilerMessages), CompilerMessages> {
    let module = read_module(input)?;
    let compiled = compile_module(&module, config, flags)?;
    Ok((
        compiled.wasm_bytes,
        CompilerMessages::from_errors(Vec::new(), compiled.warnings),
    ))
}

fn read_module(input: &Path) -> Result<Module, CompilerError> {
    let source = fs::read_to_string(input)
        .map_err(|e| CompilerError::file_error(input, format!("Couldn't read module: {e}")))?;

    serde_json::from_str(&source).map_err(|e| {
        CompilerError::file_error(
            input,
            format!("Module is not valid JSON (line {}, column {}): {e}", e.line(), e.column()),
        )
    })
}

// The config lives next to the module unless a path is given
fn default_config_path(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) => dir.join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") => Ok(Command::Help),

        Some("build") => {
            let options = parse_options(&args[1..])?;
            Ok(Command::Build {
                input: options.input,
                output: options.output,
                config: options.config,
            })
        }

        Some("check") => {
            let options = parse_options(&args[1..])?;
            if options.output.is_some() {
                return Err(String::from("'check' doesn't write a module, so it takes no -o"));
            }
            Ok(Command::Check {
                input: options.input,
                config: options.config,
            })
        }

        Some(other) => Err(format!("Invalid command: '{other}'")),
        None => Err(String::from("No command given")),
    }
}

struct CommandOptions {
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_options(args: &[String]) -> Result<CommandOptions, String> {
    let mut input = None;
    let mut output = None;
    let mut config = None;
    let mut index = 0usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "-o" | "--config" => {
                let Some(value) = args.get(index + 1) else {
                    return Err(format!("Missing value for {arg}"));
                };
                if value.starts_with("--") {
                    return Err(format!("Missing value for {arg}"));
                }

                if arg == "-o" {
                    output = Some(PathBuf::from(value));
                } else {
                    config = Some(PathBuf::from(value));
                }
                index += 2;
            }

            // Handled by get_flags
            "--hide-warnings" | "--hide-timers" => index += 1,

            flag if flag.starts_with('-') => {
                return Err(format!("Unknown flag: '{flag}'"));
            }

            path => {
                if input.is_some() {
                    return Err(format!("Only one module can be compiled at a time, got '{path}' as well"));
                }
                input = Some(PathBuf::from(path));
                index += 1;
            }
        }
    }

    let Some(input) = input else {
        return Err(String::from("Missing path to the module JSON"));
    };

    Ok(CommandOptions {
        input,
        output,
        config,
    })
}

fn get_flags(args: &[String]) -> Vec<Flag> {
    let mut flags = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--hide-warnings" => flags.push(Flag::DisableWarnings),
            "--hide-timers" => flags.push(Flag::DisableTimers),
            _ => {}
        }
    }

    flags
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bold "possum compiler");
        say!("Compiles a parsed possum module to WebAssembly");
    }

    say!(Green "Usage: ", "possum <command> <module.json> <args>");
    say!(Bold "Commands:");
    say!("  build <module.json>  - Compiles the module and writes a .wasm file next to it");
    say!("  check <module.json>  - Reports errors and warnings without writing anything");
    say!("  help                 - Shows this message");
    say!(Bold "Options:");
    say!("  -o <path>            - Where to write the WASM module");
    say!("  --config <path>      - Config file to use instead of ", CONFIG_FILE_NAME);
    say!("  --hide-warnings      - Don't print warnings");
    say!("  --hide-timers        - Don't print compile times");
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
