//! Memory Layout
//!
//! How each type is represented on the operand stack and in linear memory.
//!
//! - Primitives use their stack width on the operand stack and their heap width in memory.
//!   Loads sign or zero extend back to the stack width, stores narrow.
//! - Tuples and arrays are packed: each element follows the previous one with no padding.
//! - A slice is an 8 byte `(pointer, length)` descriptor.
//! - References, pointers and function pointers are a 4 byte linear memory offset.
//! - Compound values (non-empty tuples, arrays and slices) are passed around as an `i32`
//!   pointer to their first byte.
//! - Unit has no stack value and takes no memory.

use crate::backends::wasm::error::WasmGenerationError;
use crate::compiler_frontend::datatypes::{HeapWidth, PrimitiveKind, StackWidth, Type};
use wasm_encoder::{Instruction, MemArg, ValType};

/// Size of a slice descriptor: a 4 byte pointer and a 4 byte length
pub const SLICE_DESCRIPTOR_SIZE: u32 = 8;

/// Size of an address in linear memory
pub const POINTER_SIZE: u32 = 4;

/// Layout of struct and enum types.
///
/// Their bodies aren't part of the language yet, so codegen asks this trait instead of
/// guessing. Implementations must be shareable across codegen threads.
pub trait NamedTypeLayout: Sync {
    fn size_in_bytes(&self, ident: &str, type_args: &[Type]) -> Result<u32, WasmGenerationError>;
}

/// The only shipped layout. Every named type is reported as unsupported.
pub struct DeferredNamedLayout;

impl NamedTypeLayout for DeferredNamedLayout {
    fn size_in_bytes(&self, ident: &str, type_args: &[Type]) -> Result<u32, WasmGenerationError> {
        Err(WasmGenerationError::unsupported_type(
            &Type::Named {
                ident: ident.to_owned(),
                type_args: type_args.to_owned(),
            },
            "struct and enum layouts are not defined yet",
        ))
    }
}

/// WASM signature of a function after unit parameters are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasmSignature {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,

    // One entry per source parameter, None for parameters with no stack value
    pub param_slots: Vec<Option<ValType>>,

    // Compound results are written through a hidden leading pointer parameter
    pub result_pointer: bool,
}

pub struct MemoryLayout<'a> {
    named: &'a dyn NamedTypeLayout,
}

impl<'a> MemoryLayout<'a> {
    pub fn new(named: &'a dyn NamedTypeLayout) -> Self {
        MemoryLayout { named }
    }

    /// The operand stack representation of a value of this type, None for unit.
    pub fn stack_type(&self, ty: &Type) -> Result<Option<ValType>, WasmGenerationError> {
        let val_type = match ty {
            Type::Primitive(kind) => stack_val_type(*kind),
            Type::Tuple(elements) if elements.is_empty() => return Ok(None),
            Type::Tuple(_)
            | Type::Array { .. }
            | Type::Slice(_)
            | Type::Reference { .. }
            | Type::Pointer(_)
            | Type::FunctionPointer { .. } => ValType::I32,
            Type::Named { ident, type_args } => {
                // Checked so the deferred layout can report it
                self.named.size_in_bytes(ident, type_args)?;
                ValType::I32
            }
            Type::Param(name) => {
                return Err(WasmGenerationError::instruction_lowering(
                    format!("generic parameter '{name}'"),
                    "every generic should have been instantiated before codegen",
                ));
            }
        };

        Ok(Some(val_type))
    }

    /// Bytes a value of this type takes in linear memory.
    pub fn heap_size(&self, ty: &Type) -> Result<u32, WasmGenerationError> {
        match ty {
            Type::Primitive(kind) => Ok(kind.heap_width().size_in_bytes()),
            Type::Tuple(elements) => {
                let mut size: u32 = 0;
                for element in elements {
                    size = size
                        .checked_add(self.heap_size(element)?)
                        .ok_or_else(|| too_large(ty))?;
                }
                Ok(size)
            }
            Type::Array { element, length } => self
                .heap_size(element)?
                .checked_mul(*length)
                .ok_or_else(|| too_large(ty)),
            Type::Slice(_) => Ok(SLICE_DESCRIPTOR_SIZE),
            Type::Reference { .. } | Type::Pointer(_) | Type::FunctionPointer { .. } => {
                Ok(POINTER_SIZE)
            }
            Type::Named { ident, type_args } => self.named.size_in_bytes(ident, type_args),
            Type::Param(name) => Err(WasmGenerationError::instruction_lowering(
                format!("generic parameter '{name}'"),
                "a generic parameter has no size",
            )),
        }
    }

    /// Offset of each element from the start of a packed tuple.
    pub fn tuple_offsets(&self, elements: &[Type]) -> Result<Vec<u32>, WasmGenerationError> {
        let mut offsets = Vec::with_capacity(elements.len());
        let mut offset: u32 = 0;
        for element in elements {
            offsets.push(offset);
            offset = offset
                .checked_add(self.heap_size(element)?)
                .ok_or_else(|| too_large(&Type::Tuple(elements.to_vec())))?;
        }

        Ok(offsets)
    }

    pub fn signature(
        &self,
        params: &[Type],
        return_type: &Type,
    ) -> Result<WasmSignature, WasmGenerationError> {
        let result_pointer = is_compound(return_type);

        let mut wasm_params = Vec::with_capacity(params.len() + 1);
        if result_pointer {
            wasm_params.push(ValType::I32);
        }

        let mut param_slots = Vec::with_capacity(params.len());
        for param in params {
            let slot = self.stack_type(param)?;
            if let Some(val_type) = slot {
                wasm_params.push(val_type);
            }
            param_slots.push(slot);
        }

        let results = self.stack_type(return_type)?.into_iter().collect();

        Ok(WasmSignature {
            params: wasm_params,
            results,
            param_slots,
            result_pointer,
        })
    }
}

/// Values of these types live in linear memory and are passed around by address.
/// References point at something else, so they are scalars themselves.
/// Every size and offset must be addressable with a 32 bit pointer.
pub fn too_large(ty: &Type) -> WasmGenerationError {
    WasmGenerationError::unsupported_type(ty, "it does not fit in 32 bit linear memory")
}

pub fn is_compound(ty: &Type) -> bool {
    match ty {
        Type::Tuple(elements) => !elements.is_empty(),
        Type::Array { .. } | Type::Slice(_) => true,
        _ => false,
    }
}

pub fn stack_val_type(kind: PrimitiveKind) -> ValType {
    match kind.stack_width() {
        StackWidth::I32 => ValType::I32,
        StackWidth::I64 => ValType::I64,
        StackWidth::F32 => ValType::F32,
        StackWidth::F64 => ValType::F64,
    }
}

fn mem_arg(offset: u32) -> MemArg {
    // Packed layouts give no alignment guarantee
    MemArg {
        offset: offset as u64,
        align: 0,
        memory_index: 0,
    }
}

/// Load that widens a stored scalar back to its stack width.
/// Expects the address on the stack.
pub fn load_instruction(ty: &Type, offset: u32) -> Result<Instruction<'static>, WasmGenerationError> {
    let arg = mem_arg(offset);

    let instruction = match ty {
        Type::Primitive(kind) => match (kind.heap_width(), kind.is_signed()) {
            (HeapWidth::I8, true) => Instruction::I32Load8S(arg),
            (HeapWidth::I8, false) => Instruction::I32Load8U(arg),
            (HeapWidth::I16, true) => Instruction::I32Load16S(arg),
            (HeapWidth::I16, false) => Instruction::I32Load16U(arg),
            (HeapWidth::I32, _) => Instruction::I32Load(arg),
            (HeapWidth::I64, _) => Instruction::I64Load(arg),
            (HeapWidth::F32, _) => Instruction::F32Load(arg),
            (HeapWidth::F64, _) => Instruction::F64Load(arg),
        },
        Type::Reference { .. } | Type::Pointer(_) | Type::FunctionPointer { .. } => {
            Instruction::I32Load(arg)
        }
        _ => {
            return Err(WasmGenerationError::instruction_lowering(
                format!("load of '{ty}'"),
                "only scalars are loaded, compound values are copied",
            ));
        }
    };

    Ok(instruction)
}

/// Store that narrows a stack scalar to its heap width.
/// Expects the address and then the value on the stack.
pub fn store_instruction(
    ty: &Type,
    offset: u32,
) -> Result<Instruction<'static>, WasmGenerationError> {
    let arg = mem_arg(offset);

    let instruction = match ty {
        Type::Primitive(kind) => match kind.heap_width() {
            HeapWidth::I8 => Instruction::I32Store8(arg),
            HeapWidth::I16 => Instruction::I32Store16(arg),
            HeapWidth::I32 => Instruction::I32Store(arg),
            HeapWidth::I64 => Instruction::I64Store(arg),
            HeapWidth::F32 => Instruction::F32Store(arg),
            HeapWidth::F64 => Instruction::F64Store(arg),
        },
        Type::Reference { .. } | Type::Pointer(_) | Type::FunctionPointer { .. } => {
            Instruction::I32Store(arg)
        }
        _ => {
            return Err(WasmGenerationError::instruction_lowering(
                format!("store of '{ty}'"),
                "only scalars are stored, compound values are copied",
            ));
        }
    };

    Ok(instruction)
}

#[cfg(test)]
#[path = "tests/memory_layout_tests.rs"]
mod tests;
