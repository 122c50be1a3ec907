use super::*;
use std::path::PathBuf;

fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

#[test]
fn an_empty_file_gives_the_defaults() {
    let config = Config::from_toml("", &config_path()).expect("empty config is valid");
    assert_eq!(config, Config::default());

    assert_eq!(config.module_name, None);
    assert_eq!(config.stack_size, 65536);
    assert_eq!(config.max_memory_pages, 16);
    assert!(config.export_memory);
    assert!(config.parallel);
    assert!(config.fold_const_calls);
    assert!(config.validate_output);
    assert_eq!(config.max_instantiation_depth, 64);
}

#[test]
fn fields_override_their_defaults() {
    let source = r#"
        module_name = "fib"
        stack_size = 4096
        parallel = false
        fold_const_calls = false
    "#;

    let config = Config::from_toml(source, &config_path()).expect("config should parse");
    assert_eq!(config.module_name.as_deref(), Some("fib"));
    assert_eq!(config.stack_size, 4096);
    assert!(!config.parallel);
    assert!(!config.fold_const_calls);
    assert_eq!(config.max_memory_pages, DEFAULT_MAX_MEMORY_PAGES);
}

#[test]
fn invalid_limits_are_rejected() {
    let error = Config::from_toml("stack_size = 0", &config_path()).expect_err("no stack");
    assert_eq!(error.kind, ErrorKind::Config);

    let error = Config::from_toml("max_memory_pages = 65537", &config_path())
        .expect_err("more than 4 GiB");
    assert_eq!(error.kind, ErrorKind::Config);

    assert!(Config::from_toml("max_memory_pages = 65536", &config_path()).is_ok());

    let error = Config::from_toml("stack_size = 4294967295", &config_path())
        .expect_err("can't be aligned");
    assert_eq!(error.kind, ErrorKind::Config);
    assert!(Config::from_toml("stack_size = 4294967288", &config_path()).is_ok());
}

#[test]
fn module_name_sets_the_output_file() {
    let input = Path::new("project/src/fibonacci.json");
    assert_eq!(
        Config::default().default_output_path(input),
        PathBuf::from("project/src/fibonacci.wasm")
    );

    let config = Config::from_toml("module_name = \"fib\"", &config_path()).expect("valid name");
    assert_eq!(
        config.default_output_path(input),
        PathBuf::from("project/src/fib.wasm")
    );

    let error = Config::from_toml("module_name = \"out/fib\"", &config_path())
        .expect_err("not a file name");
    assert_eq!(error.kind, ErrorKind::Config);
}

#[test]
fn unknown_and_mistyped_fields_are_rejected() {
    let error = Config::from_toml("stack_sise = 10", &config_path()).expect_err("typo");
    assert_eq!(error.kind, ErrorKind::Config);

    let error = Config::from_toml("parallel = \"yes\"", &config_path()).expect_err("not a bool");
    assert_eq!(error.kind, ErrorKind::Config);
    assert_eq!(error.location.scope, config_path());
}

#[test]
fn missing_files_give_the_defaults() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let config = Config::load(&dir.path().join(CONFIG_FILE_NAME)).expect("missing file is fine");
    assert_eq!(config, Config::default());
}

#[test]
fn config_files_are_read_from_disk() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "export_memory = false\nmax_instantiation_depth = 8\n")
        .expect("config should be written");

    let config = Config::load(&path).expect("config should load");
    assert!(!config.export_memory);
    assert_eq!(config.max_instantiation_depth, 8);
}

#[test]
fn unreadable_paths_are_file_errors() {
    // A directory exists but can't be read as a file
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let error = Config::load(dir.path()).expect_err("a directory is not a config file");
    assert_ne!(error.kind, ErrorKind::Config);
}
