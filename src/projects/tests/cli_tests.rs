//! Tests for CLI command parsing and the build pipeline around it.

use super::{Command, build, compile, default_config_path, get_command, get_flags};
use crate::compiler_frontend::Flag;
use crate::compiler_frontend::compiler_errors::ErrorKind;
use crate::compiler_frontend::test_support::fibonacci_module;
use std::fs;
use std::path::{Path, PathBuf};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn write_fibonacci(dir: &Path) -> PathBuf {
    let path = dir.join("fibonacci.json");
    let json = serde_json::to_string(&fibonacci_module()).expect("module should serialize");
    fs::write(&path, json).expect("module should be written");
    path
}

#[test]
fn build_command_takes_an_input_and_options() {
    let command = get_command(&args(&[
        "build",
        "fib.json",
        "-o",
        "out/fib.wasm",
        "--config",
        "release.toml",
    ]))
    .expect("command should parse");

    assert_eq!(
        command,
        Command::Build {
            input: PathBuf::from("fib.json"),
            output: Some(PathBuf::from("out/fib.wasm")),
            config: Some(PathBuf::from("release.toml")),
        }
    );
}

#[test]
fn check_command_ignores_output_flags_it_knows() {
    let command = get_command(&args(&["check", "--hide-warnings", "fib.json"]))
        .expect("command should parse");

    assert_eq!(
        command,
        Command::Check {
            input: PathBuf::from("fib.json"),
            config: None,
        }
    );
}

#[test]
fn check_command_rejects_an_output_path() {
    let error = get_command(&args(&["check", "fib.json", "-o", "fib.wasm"]))
        .expect_err("check writes nothing");
    assert!(error.contains("takes no -o"));
}

#[test]
fn commands_need_exactly_one_input() {
    let error = get_command(&args(&["build"])).expect_err("no input");
    assert_eq!(error, "Missing path to the module JSON");

    let error = get_command(&args(&["build", "a.json", "b.json"])).expect_err("two inputs");
    assert!(error.contains("Only one module"));
}

#[test]
fn option_values_are_required() {
    let error = get_command(&args(&["build", "fib.json", "-o"])).expect_err("no value");
    assert_eq!(error, "Missing value for -o");

    let error = get_command(&args(&["build", "fib.json", "--config", "--hide-timers"]))
        .expect_err("a flag is not a value");
    assert_eq!(error, "Missing value for --config");
}

#[test]
fn unknown_commands_and_flags_are_rejected() {
    let error = get_command(&args(&["run", "fib.json"])).expect_err("no run command");
    assert_eq!(error, "Invalid command: 'run'");

    let error = get_command(&args(&["build", "fib.json", "--wat"])).expect_err("unknown flag");
    assert_eq!(error, "Unknown flag: '--wat'");

    assert_eq!(get_command(&args(&["help"])), Ok(Command::Help));
}

#[test]
fn flags_are_collected_from_anywhere() {
    let flags = get_flags(&args(&["build", "--hide-timers", "fib.json", "--hide-warnings"]));
    assert_eq!(flags, vec![Flag::DisableTimers, Flag::DisableWarnings]);
}

#[test]
fn config_defaults_to_the_module_directory() {
    assert_eq!(
        default_config_path(Path::new("project/src/fib.json")),
        PathBuf::from("project/src/possum.toml")
    );
}

#[test]
fn build_writes_a_wasm_module() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let input = write_fibonacci(dir.path());
    let output = dir.path().join("fibonacci.wasm");

    let (written, messages) =
        build(&input, Some(&output), None, &[Flag::DisableTimers]).expect("build should pass");
    assert_eq!(written, output);
    assert!(!messages.has_errors());

    let bytes = fs::read(&output).expect("module should be written");
    assert_eq!(&bytes[0..4], b"\0asm");
}

#[test]
fn build_names_the_output_after_the_input_or_the_module_name() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let input = write_fibonacci(dir.path());

    let (written, _) = build(&input, None, None, &[Flag::DisableTimers]).expect("should build");
    assert_eq!(written, dir.path().join("fibonacci.wasm"));

    fs::write(dir.path().join("possum.toml"), "module_name = \"fib\"\n")
        .expect("config should be written");
    let (written, _) = build(&input, None, None, &[Flag::DisableTimers]).expect("should build");
    assert_eq!(written, dir.path().join("fib.wasm"));
    assert!(written.exists());
}

#[test]
fn compile_reads_the_config_next_to_the_module() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let input = write_fibonacci(dir.path());

    let (with_memory, _) = compile(&input, None, &[Flag::DisableTimers]).expect("should compile");

    fs::write(dir.path().join("possum.toml"), "export_memory = false\n")
        .expect("config should be written");
    let (without_memory, _) =
        compile(&input, None, &[Flag::DisableTimers]).expect("should compile");

    assert!(without_memory.len() < with_memory.len());
}

#[test]
fn invalid_json_is_a_file_error() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let input = dir.path().join("broken.json");
    fs::write(&input, "{ \"path\": ").expect("file should be written");

    let messages = compile(&input, None, &[]).expect_err("JSON is cut off");
    assert_eq!(messages.errors.len(), 1);
    assert_eq!(messages.errors[0].kind, ErrorKind::Io);
}

#[test]
fn invalid_config_stops_the_build() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let input = write_fibonacci(dir.path());
    let config = dir.path().join("custom.toml");
    fs::write(&config, "stack_size = 0\n").expect("config should be written");

    let messages = compile(&input, Some(&config), &[]).expect_err("stack_size is invalid");
    assert_eq!(messages.errors[0].kind, ErrorKind::Config);
}
