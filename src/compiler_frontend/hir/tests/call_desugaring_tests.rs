use super::*;
use crate::compiler_frontend::ast::ast_nodes::FunctionDecl;
use crate::compiler_frontend::datatypes::PrimitiveKind;
use crate::compiler_frontend::hir::hir_nodes::LocalId;
use crate::compiler_frontend::test_support::{
    call, cast, fibonacci_module, function, generic, ident, int, lower_named, method, module,
    param, tuple, ty, u64_math_imports,
};

fn u64_type() -> Type {
    Type::Primitive(PrimitiveKind::U64)
}

fn math_body(body: Expr) -> Expression {
    let source = module(
        u64_math_imports(),
        vec![function(
            "f",
            vec![param("a", ty("u64")), param("b", ty("u64"))],
            Some(ty("u64")),
            body,
        )],
    );

    lower_named(&source, "f").expect("f should check").function.body
}

fn call_error(functions: Vec<FunctionDecl>, caller: &str) -> ErrorKind {
    lower_named(&module(Vec::new(), functions), caller)
        .expect_err("call should be rejected")
        .kind
}

fn as_call(expression: &Expression) -> &CanonicalCall {
    match &expression.kind {
        ExpressionKind::Call(call) => call,
        other => panic!("expected a call, found {other:?}"),
    }
}

#[test]
fn every_call_form_desugars_to_the_same_prefix_call() {
    let prefix = math_body(call("sub", vec![ident("a"), ident("b")]));

    assert_eq!(math_body(method(ident("a"), "sub", vec![ident("b")])), prefix);
    assert_eq!(
        math_body(method(tuple(vec![ident("a")]), "sub", vec![ident("b")])),
        prefix
    );
    assert_eq!(
        math_body(method(tuple(vec![ident("a"), ident("b")]), "sub", Vec::new())),
        prefix
    );
    assert_eq!(
        math_body(call("sub", vec![tuple(vec![tuple(vec![ident("a")])]), ident("b")])),
        prefix
    );
}

#[test]
fn remaining_arguments_are_typed_by_the_chosen_overload() {
    let body = math_body(method(ident("a"), "sub", vec![int(2)]));
    let sub = as_call(&body);

    assert_eq!(sub.target, FunctionRef::plain(FunctionId(1)));
    assert_eq!(sub.args[0].value.kind, ExpressionKind::Local(LocalId(0)));
    assert_eq!(sub.args[1].value.kind, ExpressionKind::Int(2));
    assert_eq!(sub.args[1].value.data_type, u64_type());
    assert_eq!(sub.args[1].cast, CastKind::Identity);
}

#[test]
fn fibonacci_recursion_is_a_chain_of_prefix_calls() {
    let lowered = lower_named(&fibonacci_module(), "fibonacci").expect("fibonacci should check");

    let ExpressionKind::Match(lowered_match) = &lowered.function.body.kind else {
        panic!("fibonacci's body should be a match");
    };
    assert_eq!(lowered_match.arms[0].kind, ExpressionKind::Int(1));

    // add(fibonacci(sub(n, 2)), fibonacci(sub(n, 1)))
    let add = as_call(&lowered_match.arms[1]);
    assert_eq!(add.target.id, FunctionId(0));

    for (arg, offset) in add.args.iter().zip([2, 1]) {
        let fibonacci = as_call(&arg.value);
        assert_eq!(fibonacci.target.id, FunctionId(2));

        let sub = as_call(&fibonacci.args[0].value);
        assert_eq!(sub.target.id, FunctionId(1));
        assert_eq!(sub.args[0].value.kind, ExpressionKind::Local(LocalId(0)));
        assert_eq!(sub.args[1].value.kind, ExpressionKind::Int(offset));
    }

    assert!(lowered.requests.is_empty());
}

#[test]
fn calls_accepted_by_several_overloads_are_ambiguous() {
    let overloads = || {
        vec![
            function("f", vec![param("x", ty("u16"))], None, int(0)),
            function("f", vec![param("x", ty("u32"))], None, int(0)),
        ]
    };

    let mut functions = overloads();
    functions.push(function(
        "main",
        vec![param("a", ty("u8"))],
        None,
        call("f", vec![ident("a")]),
    ));
    assert_eq!(
        call_error(functions, "main"),
        ErrorKind::AmbiguousCall {
            name: String::from("f"),
            candidates: 2,
        }
    );

    // An unsuffixed literal fits both parameter types as well
    let mut functions = overloads();
    functions.push(function("main", Vec::new(), None, call("f", vec![int(1)])));
    assert!(matches!(
        call_error(functions, "main"),
        ErrorKind::AmbiguousCall { .. }
    ));
}

#[test]
fn explicit_casts_pick_an_overload() {
    let source = module(
        Vec::new(),
        vec![
            function("f", vec![param("x", ty("u16"))], None, int(0)),
            function("f", vec![param("x", ty("u32"))], None, int(0)),
            function(
                "main",
                vec![param("a", ty("u8"))],
                None,
                call("f", vec![cast(ident("a"), ty("u32"))]),
            ),
        ],
    );

    let body = lower_named(&source, "main").expect("the cast picks f(u32)").function.body;
    assert_eq!(as_call(&body).target.id, FunctionId(1));
}

#[test]
fn argument_counts_are_checked_first() {
    let kind = call_error(
        vec![
            function("f", vec![param("x", ty("u8"))], None, int(0)),
            function("main", Vec::new(), None, call("f", Vec::new())),
        ],
        "main",
    );
    assert_eq!(
        kind,
        ErrorKind::ArityMismatch {
            name: String::from("f"),
            expected: 1,
            found: 0,
        }
    );

    let kind = call_error(
        vec![
            function("f", vec![param("x", ty("u8"))], None, int(0)),
            function(
                "f",
                vec![param("x", ty("u8")), param("y", ty("u8"))],
                None,
                int(0),
            ),
            function("main", Vec::new(), None, call("f", Vec::new())),
        ],
        "main",
    );
    assert!(matches!(kind, ErrorKind::NoMatchingFunction { .. }));
}

#[test]
fn arguments_that_cant_cast_implicitly_match_nothing() {
    let kind = call_error(
        vec![
            function("f", vec![param("x", ty("u8"))], None, int(0)),
            function(
                "main",
                vec![param("flag", ty("bool"))],
                None,
                call("f", vec![ident("flag")]),
            ),
        ],
        "main",
    );

    assert_eq!(
        kind,
        ErrorKind::NoMatchingFunction {
            name: String::from("f")
        }
    );
}

#[test]
fn unknown_functions_are_reported_by_name() {
    let kind = call_error(
        vec![function("main", Vec::new(), None, call("missing", Vec::new()))],
        "main",
    );

    assert_eq!(
        kind,
        ErrorKind::UnknownIdentifier {
            name: String::from("missing")
        }
    );
}

#[test]
fn generic_calls_request_an_instantiation() {
    let source = module(
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
    );

    let lowered = lower_named(&source, "main").expect("main should check");
    let target = FunctionRef {
        id: FunctionId(0),
        type_args: vec![u64_type()],
    };

    assert_eq!(as_call(&lowered.function.body).target, target);
    assert_eq!(lowered.function.body.data_type, u64_type());
    assert_eq!(lowered.requests.len(), 1);
    assert_eq!(lowered.requests[0].target, target);
}

#[test]
fn unbound_type_params_cannot_be_inferred() {
    let kind = call_error(
        vec![
            generic(function("make", Vec::new(), Some(ty("T")), int(0)), &["T"]),
            function("main", Vec::new(), None, call("make", Vec::new())),
        ],
        "main",
    );

    assert_eq!(kind, ErrorKind::CannotInferType);
}

#[test]
fn unify_binds_through_one_step_adjustments() {
    let t = Type::Param(String::from("T"));
    let u8_type = Type::Primitive(PrimitiveKind::U8);

    let mut bindings = Bindings::default();
    assert!(unify(&Type::reference_to(t.to_owned()), &u8_type, &mut bindings));
    assert_eq!(bindings.get("T"), Some(&u8_type));

    let mut bindings = Bindings::default();
    assert!(unify(&Type::Tuple(vec![t.to_owned()]), &u64_type(), &mut bindings));
    assert_eq!(bindings.get("T"), Some(&u64_type()));

    let mut bindings = Bindings::default();
    assert!(!unify(&Type::Slice(Box::new(t.to_owned())), &u8_type, &mut bindings));
}

#[test]
fn unify_keeps_the_first_binding() {
    let t = Type::Param(String::from("T"));
    let pair = Type::Tuple(vec![t.to_owned(), t]);
    let found = Type::Tuple(vec![
        Type::Primitive(PrimitiveKind::U8),
        Type::Primitive(PrimitiveKind::U16),
    ]);

    let mut bindings = Bindings::default();
    assert!(unify(&pair, &found, &mut bindings));
    assert_eq!(bindings.get("T"), Some(&Type::Primitive(PrimitiveKind::U8)));
}
