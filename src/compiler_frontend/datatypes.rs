use crate::compiler_frontend::ast::ast_nodes::GenericParam;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The eleven primitive kinds of the language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    S8,
    S16,
    S32,
    S64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
}

/// WASM value type a primitive uses on the operand stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackWidth {
    I32,
    I64,
    F32,
    F64,
}

/// Storage width a primitive uses once it lives in linear memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapWidth {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl HeapWidth {
    pub fn size_in_bytes(self) -> u32 {
        match self {
            HeapWidth::I8 => 1,
            HeapWidth::I16 => 2,
            HeapWidth::I32 | HeapWidth::F32 => 4,
            HeapWidth::I64 | HeapWidth::F64 => 8,
        }
    }
}

impl PrimitiveKind {
    pub const INTEGERS: [PrimitiveKind; 8] = [
        PrimitiveKind::S8,
        PrimitiveKind::S16,
        PrimitiveKind::S32,
        PrimitiveKind::S64,
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
    ];

    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        let kind = match name {
            "s8" => PrimitiveKind::S8,
            "s16" => PrimitiveKind::S16,
            "s32" => PrimitiveKind::S32,
            "s64" => PrimitiveKind::S64,
            "u8" => PrimitiveKind::U8,
            "u16" => PrimitiveKind::U16,
            "u32" => PrimitiveKind::U32,
            "u64" => PrimitiveKind::U64,
            "f32" => PrimitiveKind::F32,
            "f64" => PrimitiveKind::F64,
            "bool" => PrimitiveKind::Bool,
            _ => return None,
        };

        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::S8 => "s8",
            PrimitiveKind::S16 => "s16",
            PrimitiveKind::S32 => "s32",
            PrimitiveKind::S64 => "s64",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Bool => "bool",
        }
    }

    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimitiveKind::S8 | PrimitiveKind::S16 | PrimitiveKind::S32 | PrimitiveKind::S64
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            PrimitiveKind::U8 | PrimitiveKind::U16 | PrimitiveKind::U32 | PrimitiveKind::U64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::F32 | PrimitiveKind::F64)
    }

    /// Number of value bits. Bool is a one bit domain even though it is stored in a byte.
    pub fn bit_width(self) -> u32 {
        match self {
            PrimitiveKind::Bool => 1,
            PrimitiveKind::S8 | PrimitiveKind::U8 => 8,
            PrimitiveKind::S16 | PrimitiveKind::U16 => 16,
            PrimitiveKind::S32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 32,
            PrimitiveKind::S64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 64,
        }
    }

    pub fn stack_width(self) -> StackWidth {
        match self {
            PrimitiveKind::S64 | PrimitiveKind::U64 => StackWidth::I64,
            PrimitiveKind::F32 => StackWidth::F32,
            PrimitiveKind::F64 => StackWidth::F64,
            _ => StackWidth::I32,
        }
    }

    pub fn heap_width(self) -> HeapWidth {
        match self {
            PrimitiveKind::S8 | PrimitiveKind::U8 | PrimitiveKind::Bool => HeapWidth::I8,
            PrimitiveKind::S16 | PrimitiveKind::U16 => HeapWidth::I16,
            PrimitiveKind::S32 | PrimitiveKind::U32 => HeapWidth::I32,
            PrimitiveKind::S64 | PrimitiveKind::U64 => HeapWidth::I64,
            PrimitiveKind::F32 => HeapWidth::F32,
            PrimitiveKind::F64 => HeapWidth::F64,
        }
    }

    /// Smallest and largest value of an integer kind.
    pub fn integer_range(self) -> Option<(i128, i128)> {
        let bits = self.bit_width();
        if self.is_signed() {
            Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1))
        } else if self.is_unsigned() {
            Some((0, (1i128 << bits) - 1))
        } else {
            None
        }
    }

    /// Wraps an integer into this kind's two's complement range.
    /// Signed kinds are kept sign extended, unsigned kinds zero extended.
    pub fn wrap(self, value: i128) -> i128 {
        let bits = self.bit_width();
        let mask = (1i128 << bits) - 1;
        let truncated = value & mask;
        if self.is_signed() && truncated >> (bits - 1) & 1 == 1 {
            truncated - (1i128 << bits)
        } else {
            truncated
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical internal type.
///
/// Two types are equal when they are structurally equal. Lifetimes are kept so they can be
/// printed in messages, but they never take part in cast legality (see [`Type::erase_lifetimes`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveKind),

    // The empty tuple is the unit type
    Tuple(Vec<Type>),
    Slice(Box<Type>),
    Array {
        element: Box<Type>,
        length: u32,
    },
    Reference {
        lifetime: Option<String>,
        target: Box<Type>,
    },
    Pointer(Box<Type>),
    FunctionPointer {
        generics: Vec<GenericParam>,
        params: Vec<Type>,
        result: Box<Type>,
    },

    // Struct and enum bodies are not defined yet, so these only carry their name
    Named {
        ident: String,
        type_args: Vec<Type>,
    },

    // A generic type parameter inside a signature that has not been instantiated
    Param(String),
}

impl Type {
    pub fn unit() -> Type {
        Type::Tuple(Vec::new())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Type::Tuple(elements) if elements.is_empty())
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn reference_to(target: Type) -> Type {
        Type::Reference {
            lifetime: None,
            target: Box::new(target),
        }
    }

    /// Strips `&`, `*` and mono-tuple wrappers until a primitive is found.
    /// Used to type untyped literals from the context they appear in.
    pub fn literal_hint(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            Type::Reference { target, .. } => target.literal_hint(),
            Type::Pointer(target) => target.literal_hint(),
            Type::Tuple(elements) if elements.len() == 1 => elements[0].literal_hint(),
            _ => None,
        }
    }

    pub fn erase_lifetimes(&self) -> Type {
        match self {
            Type::Primitive(_) | Type::Param(_) => self.to_owned(),
            Type::Tuple(elements) => {
                Type::Tuple(elements.iter().map(Type::erase_lifetimes).collect())
            }
            Type::Slice(element) => Type::Slice(Box::new(element.erase_lifetimes())),
            Type::Array { element, length } => Type::Array {
                element: Box::new(element.erase_lifetimes()),
                length: *length,
            },
            Type::Reference { target, .. } => Type::Reference {
                lifetime: None,
                target: Box::new(target.erase_lifetimes()),
            },
            Type::Pointer(target) => Type::Pointer(Box::new(target.erase_lifetimes())),
            Type::FunctionPointer {
                generics,
                params,
                result,
            } => Type::FunctionPointer {
                generics: generics
                    .iter()
                    .filter(|generic| matches!(generic, GenericParam::Type(_)))
                    .cloned()
                    .collect(),
                params: params.iter().map(Type::erase_lifetimes).collect(),
                result: Box::new(result.erase_lifetimes()),
            },
            Type::Named { ident, type_args } => Type::Named {
                ident: ident.to_owned(),
                type_args: type_args.iter().map(Type::erase_lifetimes).collect(),
            },
        }
    }

    pub fn same_ignoring_lifetimes(&self, other: &Type) -> bool {
        self.erase_lifetimes() == other.erase_lifetimes()
    }

    pub fn contains_param(&self) -> bool {
        match self {
            Type::Param(_) => true,
            Type::Primitive(_) => false,
            Type::Tuple(elements) => elements.iter().any(Type::contains_param),
            Type::Slice(element) | Type::Pointer(element) => element.contains_param(),
            Type::Array { element, .. } => element.contains_param(),
            Type::Reference { target, .. } => target.contains_param(),
            Type::FunctionPointer { params, result, .. } => {
                params.iter().any(Type::contains_param) || result.contains_param()
            }
            Type::Named { type_args, .. } => type_args.iter().any(Type::contains_param),
        }
    }

    /// Replaces generic parameters with their bound types.
    /// Unbound parameters are left in place.
    pub fn substitute(&self, bindings: &FxHashMap<String, Type>) -> Type {
        match self {
            Type::Param(name) => match bindings.get(name) {
                Some(bound) => bound.to_owned(),
                None => self.to_owned(),
            },
            Type::Primitive(_) => self.to_owned(),
            Type::Tuple(elements) => Type::Tuple(
                elements
                    .iter()
                    .map(|element| element.substitute(bindings))
                    .collect(),
            ),
            Type::Slice(element) => Type::Slice(Box::new(element.substitute(bindings))),
            Type::Array { element, length } => Type::Array {
                element: Box::new(element.substitute(bindings)),
                length: *length,
            },
            Type::Reference { lifetime, target } => Type::Reference {
                lifetime: lifetime.to_owned(),
                target: Box::new(target.substitute(bindings)),
            },
            Type::Pointer(target) => Type::Pointer(Box::new(target.substitute(bindings))),
            Type::FunctionPointer {
                generics,
                params,
                result,
            } => Type::FunctionPointer {
                generics: generics.to_owned(),
                params: params.iter().map(|param| param.substitute(bindings)).collect(),
                result: Box::new(result.substitute(bindings)),
            },
            Type::Named { ident, type_args } => Type::Named {
                ident: ident.to_owned(),
                type_args: type_args.iter().map(|arg| arg.substitute(bindings)).collect(),
            },
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => write!(f, "{kind}"),
            Type::Tuple(elements) => {
                write!(f, "(")?;
                write_list(f, elements)?;
                write!(f, ")")
            }
            Type::Slice(element) => write!(f, "[{element}]"),
            Type::Array { element, length } => write!(f, "[{element}; {length}]"),
            Type::Reference {
                lifetime: Some(lifetime),
                target,
            } => write!(f, "&{lifetime} {target}"),
            Type::Reference { target, .. } => write!(f, "&{target}"),
            Type::Pointer(target) => write!(f, "*{target}"),
            Type::FunctionPointer {
                generics,
                params,
                result,
            } => {
                write!(f, "fn")?;
                if !generics.is_empty() {
                    let names: Vec<&str> = generics.iter().map(GenericParam::name).collect();
                    write!(f, "<{}>", names.join(", "))?;
                }
                write!(f, "(")?;
                write_list(f, params)?;
                write!(f, ") -> {result}")
            }
            Type::Named { ident, type_args } => {
                write!(f, "{ident}")?;
                if !type_args.is_empty() {
                    write!(f, "<")?;
                    write_list(f, type_args)?;
                    write!(f, ">")?;
                }
                Ok(())
            }
            Type::Param(name) => write!(f, "{name}"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (index, ty) in types.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/datatypes_tests.rs"]
mod tests;
