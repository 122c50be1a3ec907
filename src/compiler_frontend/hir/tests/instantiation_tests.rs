use super::*;
use crate::compiler_frontend::datatypes::{PrimitiveKind, Type};
use crate::compiler_frontend::test_support::{
    call, fibonacci_module, function, generic, ident, int, module, param, reference,
    sequential_config, symbols_for, ty,
};

fn build(module: &Module, config: &Config) -> Result<(HirModule, Vec<CompilerWarning>), CompilerMessages> {
    build_hir_module(module, &symbols_for(module), config)
}

fn identity_module() -> Module {
    module(
        Vec::new(),
        vec![
            generic(
                function("identity", vec![param("x", ty("T"))], Some(ty("T")), ident("x")),
                &["T"],
            ),
            function(
                "main",
                vec![param("a", ty("u64"))],
                Some(ty("u64")),
                call("identity", vec![ident("a")]),
            ),
        ],
    )
}

#[test]
fn generic_functions_are_checked_once_per_instantiation() {
    let (hir, warnings) = build(&identity_module(), &sequential_config()).expect("module should check");

    let names: Vec<&str> = hir.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["main", "identity<u64>"]);

    let instance = &hir.functions[1];
    assert_eq!(instance.params[0].data_type, Type::Primitive(PrimitiveKind::U64));
    assert_eq!(instance.return_type, Type::Primitive(PrimitiveKind::U64));
    assert!(warnings.is_empty());
}

#[test]
fn repeated_instantiations_are_only_checked_once() {
    let mut source = identity_module();
    source.functions.push(function(
        "other",
        vec![param("b", ty("u64"))],
        Some(ty("u64")),
        call("identity", vec![ident("b")]),
    ));

    let (hir, _) = build(&source, &sequential_config()).expect("module should check");
    let instances = hir
        .functions
        .iter()
        .filter(|f| f.name == "identity<u64>")
        .count();
    assert_eq!(instances, 1);
}

#[test]
fn generics_nobody_calls_are_not_checked() {
    // The body refers to a parameter that doesn't exist
    let source = module(
        Vec::new(),
        vec![generic(
            function("unused", vec![param("x", ty("T"))], Some(ty("T")), ident("nope")),
            &["T"],
        )],
    );

    let (hir, warnings) = build(&source, &sequential_config()).expect("unused generics are fine");
    assert!(hir.functions.is_empty());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].warning_kind, WarningKind::UninstantiatedGeneric);
}

#[test]
fn runaway_instantiation_hits_the_depth_limit() {
    // grow<T> calls grow<&T>, so every level asks for a new instantiation
    let source = module(
        Vec::new(),
        vec![
            generic(
                function(
                    "grow",
                    vec![param("x", ty("T"))],
                    None,
                    call("grow", vec![reference(ident("x"))]),
                ),
                &["T"],
            ),
            function(
                "main",
                vec![param("a", ty("u8"))],
                None,
                call("grow", vec![ident("a")]),
            ),
        ],
    );

    let config = Config {
        max_instantiation_depth: 3,
        ..sequential_config()
    };
    let messages = build(&source, &config).expect_err("grow never stops");

    assert_eq!(messages.errors.len(), 1);
    assert!(matches!(
        messages.errors[0].kind,
        ErrorKind::InstantiationLimit { depth: 4, .. }
    ));
}

#[test]
fn every_failing_function_reports_its_error() {
    let source = module(
        Vec::new(),
        vec![
            function("first", Vec::new(), Some(ty("u8")), ident("missing")),
            function("fine", Vec::new(), Some(ty("u8")), int(1)),
            function("second", Vec::new(), Some(ty("u8")), int(1000)),
        ],
    );

    let messages = build(&source, &sequential_config()).expect_err("two functions fail");
    assert_eq!(messages.errors.len(), 2);
    assert!(matches!(messages.errors[0].kind, ErrorKind::UnknownIdentifier { .. }));
    assert!(matches!(messages.errors[1].kind, ErrorKind::LiteralOutOfRange { .. }));
}

#[test]
fn parallel_checking_matches_sequential_checking() {
    let source = fibonacci_module();
    let parallel = Config {
        parallel: true,
        ..Config::default()
    };

    let (sequential, _) = build(&source, &sequential_config()).expect("module should check");
    let (parallel, _) = build(&source, &parallel).expect("module should check");

    assert_eq!(sequential.functions.len(), parallel.functions.len());
    for (a, b) in sequential.functions.iter().zip(&parallel.functions) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.body, b.body);
    }
}
