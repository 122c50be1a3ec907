//! Cast legality.
//!
//! Every conversion the language allows is one step from this table. Nothing chains:
//! `u8 -> &u16` is not legal even though `u8 -> u16` and `u16 -> &u16` both are.

use crate::compiler_frontend::datatypes::{PrimitiveKind, Type};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastKind {
    // Same type, nothing to do
    Identity,

    // Inserted by the compiler at call sites, return position and match arms
    Implicit,

    // Only legal when written with `as`
    ExplicitOnly,

    Illegal,
}

impl CastKind {
    pub fn is_implicit_legal(self) -> bool {
        matches!(self, CastKind::Identity | CastKind::Implicit)
    }

    pub fn is_explicit_legal(self) -> bool {
        !matches!(self, CastKind::Illegal)
    }
}

pub fn cast_kind(from: &Type, to: &Type) -> CastKind {
    if from.same_ignoring_lifetimes(to) {
        return CastKind::Identity;
    }

    if let (Type::Primitive(from_kind), Type::Primitive(to_kind)) = (from, to) {
        return primitive_cast(*from_kind, *to_kind);
    }

    // T -> &T
    if let Type::Reference { target, .. } = to {
        if from.same_ignoring_lifetimes(target) {
            return CastKind::Implicit;
        }
    }

    if let Type::Pointer(pointee) = to {
        // &T -> *T
        if let Type::Reference { target, .. } = from {
            if target.same_ignoring_lifetimes(pointee) {
                return CastKind::Implicit;
            }
        }

        // T -> *T
        if from.same_ignoring_lifetimes(pointee) {
            return CastKind::Implicit;
        }
    }

    // T -> (T)
    if let Type::Tuple(elements) = to {
        if elements.len() == 1 && from.same_ignoring_lifetimes(&elements[0]) {
            return CastKind::Implicit;
        }
    }

    // (T) -> T
    if let Type::Tuple(elements) = from {
        if elements.len() == 1 && elements[0].same_ignoring_lifetimes(to) {
            return CastKind::Implicit;
        }
    }

    CastKind::Illegal
}

pub fn primitive_cast(from: PrimitiveKind, to: PrimitiveKind) -> CastKind {
    if from == to {
        return CastKind::Identity;
    }

    if from.is_integer() && to.is_integer() {
        return integer_cast(from, to);
    }

    match (from, to) {
        (PrimitiveKind::F32, PrimitiveKind::F64) => CastKind::Implicit,

        // Every integer has a truth value, but asking for it has to be spelled out
        (from, PrimitiveKind::Bool) if from.is_integer() => CastKind::ExplicitOnly,

        _ => CastKind::Illegal,
    }
}

/// The integer matrix.
///
/// ```text
///        s8  s16 s32 s64 u8  u16 u32 u64
///   s8   =   I   I   I
///   s16      =   I   I
///   s32          =   I
///   s64              =
///   u8       X   X   X   =   I   I   I
///   u16          X   X       =   I   I
///   u32              X           =   I
///   u64                              =
/// ```
///
/// `I` is implicit widening within a signedness class, `X` is the explicit-only
/// unsigned to strictly wider signed conversion. Every blank cell is illegal.
fn integer_cast(from: PrimitiveKind, to: PrimitiveKind) -> CastKind {
    let widening = to.bit_width() > from.bit_width();

    if from.is_signed() == to.is_signed() {
        if widening {
            CastKind::Implicit
        } else {
            CastKind::Illegal
        }
    } else if from.is_unsigned() && widening {
        CastKind::ExplicitOnly
    } else {
        CastKind::Illegal
    }
}

#[cfg(test)]
#[path = "tests/casts_tests.rs"]
mod tests;
