use super::*;

#[test]
fn primitive_names_round_trip_through_from_name() {
    let all = [
        PrimitiveKind::S8,
        PrimitiveKind::S16,
        PrimitiveKind::S32,
        PrimitiveKind::S64,
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
        PrimitiveKind::Bool,
    ];

    for kind in all {
        assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
    }

    assert_eq!(PrimitiveKind::from_name("i32"), None);
    assert_eq!(PrimitiveKind::from_name("usize"), None);
}

#[test]
fn narrow_integers_use_i32_on_the_stack() {
    for kind in [
        PrimitiveKind::S8,
        PrimitiveKind::S16,
        PrimitiveKind::S32,
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::Bool,
    ] {
        assert_eq!(kind.stack_width(), StackWidth::I32, "{kind}");
    }

    assert_eq!(PrimitiveKind::S64.stack_width(), StackWidth::I64);
    assert_eq!(PrimitiveKind::U64.stack_width(), StackWidth::I64);
    assert_eq!(PrimitiveKind::F32.stack_width(), StackWidth::F32);
    assert_eq!(PrimitiveKind::F64.stack_width(), StackWidth::F64);
}

#[test]
fn heap_widths_match_the_value_width() {
    assert_eq!(PrimitiveKind::Bool.heap_width(), HeapWidth::I8);
    assert_eq!(PrimitiveKind::U8.heap_width(), HeapWidth::I8);
    assert_eq!(PrimitiveKind::S16.heap_width(), HeapWidth::I16);
    assert_eq!(PrimitiveKind::U32.heap_width(), HeapWidth::I32);
    assert_eq!(PrimitiveKind::S64.heap_width(), HeapWidth::I64);
    assert_eq!(PrimitiveKind::F32.heap_width().size_in_bytes(), 4);
    assert_eq!(PrimitiveKind::F64.heap_width().size_in_bytes(), 8);
}

#[test]
fn integer_ranges() {
    assert_eq!(PrimitiveKind::S8.integer_range(), Some((-128, 127)));
    assert_eq!(PrimitiveKind::U8.integer_range(), Some((0, 255)));
    assert_eq!(
        PrimitiveKind::U64.integer_range(),
        Some((0, u64::MAX as i128))
    );
    assert_eq!(
        PrimitiveKind::S64.integer_range(),
        Some((i64::MIN as i128, i64::MAX as i128))
    );
    assert_eq!(PrimitiveKind::F32.integer_range(), None);
    assert_eq!(PrimitiveKind::Bool.integer_range(), None);
}

#[test]
fn wrap_keeps_twos_complement_patterns() {
    assert_eq!(PrimitiveKind::S8.wrap(255), -1);
    assert_eq!(PrimitiveKind::S8.wrap(128), -128);
    assert_eq!(PrimitiveKind::U8.wrap(-1), 255);
    assert_eq!(PrimitiveKind::U8.wrap(256), 0);
    assert_eq!(PrimitiveKind::S32.wrap(i32::MAX as i128 + 1), i32::MIN as i128);
    assert_eq!(PrimitiveKind::U64.wrap(-1), u64::MAX as i128);
}

#[test]
fn literal_hint_looks_through_references_pointers_and_mono_tuples() {
    let u16_type = Type::Primitive(PrimitiveKind::U16);

    assert_eq!(
        Type::reference_to(u16_type.to_owned()).literal_hint(),
        Some(PrimitiveKind::U16)
    );
    assert_eq!(
        Type::Pointer(Box::new(u16_type.to_owned())).literal_hint(),
        Some(PrimitiveKind::U16)
    );
    assert_eq!(
        Type::Tuple(vec![u16_type.to_owned()]).literal_hint(),
        Some(PrimitiveKind::U16)
    );
    assert_eq!(
        Type::Tuple(vec![u16_type.to_owned(), u16_type]).literal_hint(),
        None
    );
}

#[test]
fn lifetimes_do_not_affect_equality_after_erasure() {
    let with_lifetime = Type::Reference {
        lifetime: Some(String::from("'a")),
        target: Box::new(Type::Primitive(PrimitiveKind::U8)),
    };
    let plain = Type::reference_to(Type::Primitive(PrimitiveKind::U8));

    assert_ne!(with_lifetime, plain);
    assert!(with_lifetime.same_ignoring_lifetimes(&plain));
}

#[test]
fn substitute_replaces_bound_params_only() {
    let mut bindings = FxHashMap::default();
    bindings.insert(String::from("T"), Type::Primitive(PrimitiveKind::U64));

    let ty = Type::Tuple(vec![
        Type::Param(String::from("T")),
        Type::reference_to(Type::Param(String::from("U"))),
    ]);

    let substituted = ty.substitute(&bindings);
    assert_eq!(
        substituted,
        Type::Tuple(vec![
            Type::Primitive(PrimitiveKind::U64),
            Type::reference_to(Type::Param(String::from("U"))),
        ])
    );
    assert!(substituted.contains_param());
}

#[test]
fn types_display_the_way_they_are_written() {
    let ty = Type::FunctionPointer {
        generics: Vec::new(),
        params: vec![
            Type::Array {
                element: Box::new(Type::Primitive(PrimitiveKind::U8)),
                length: 4,
            },
            Type::Slice(Box::new(Type::Primitive(PrimitiveKind::F32))),
        ],
        result: Box::new(Type::unit()),
    };

    assert_eq!(ty.to_string(), "fn([u8; 4], [f32]) -> ()");
    assert_eq!(
        Type::Named {
            ident: String::from("Pair"),
            type_args: vec![Type::Primitive(PrimitiveKind::S32)],
        }
        .to_string(),
        "Pair<s32>"
    );
}
