//! Function Lowerer
//!
//! Lowers one HIR function body into a WASM function.
//!
//! Every expression leaves exactly its stack representation on the operand stack
//! (see `memory_layout`). Instructions are buffered, because the frame a body needs is only
//! known once the whole body has been lowered.
//!
//! ## Frames
//! Tuple and array literals, scalars whose address is taken and compound call results all
//! live in the function's frame on the shadow stack. The frame is reserved from
//! `__stack_pointer` at entry and released at exit; functions that need no frame never
//! touch the stack pointer.

use crate::backends::wasm::error::WasmGenerationError;
use crate::backends::wasm::local_manager::LocalManager;
use crate::backends::wasm::memory_layout::{
    MemoryLayout, WasmSignature, is_compound, load_instruction, store_instruction, too_large,
};
use crate::codegen_log;
use crate::compiler_frontend::analysis::match_compiler::{Condition, PatternValue};
use crate::compiler_frontend::casts::CastKind;
use crate::compiler_frontend::datatypes::{PrimitiveKind, StackWidth, Type};
use crate::compiler_frontend::hir::hir_nodes::{
    CanonicalCall, Expression, ExpressionKind, FunctionRef, HirFunction, HirMatch,
};
use rustc_hash::FxHashMap;
use wasm_encoder::{BlockType, Function, Ieee32, Ieee64, Instruction, ValType};

// Frames are kept 8 byte aligned so i64 and f64 slots never straddle a frame boundary
const FRAME_ALIGNMENT: u32 = 8;

/// Read-only state shared by every function of a module.
pub struct CodegenContext<'a> {
    pub layout: &'a MemoryLayout<'a>,
    pub function_indices: &'a FxHashMap<FunctionRef, u32>,
    pub stack_pointer: u32,
}

pub struct LoweredBody {
    pub function: Function,

    // Bytes of shadow stack the function reserves, already aligned
    pub frame_size: u32,
}

pub fn lower_function(
    ctx: &CodegenContext,
    function: &HirFunction,
    signature: &WasmSignature,
) -> Result<LoweredBody, WasmGenerationError> {
    codegen_log!("Lowering ", Blue function.name);

    let mut lowerer = FunctionLowerer {
        ctx,
        locals: LocalManager::new(signature),
        instructions: Vec::new(),
        frame_size: 0,
        frame_pointer: None,
    };

    match lowerer.locals.result_pointer() {
        Some(result_pointer) => {
            // Copy the result out of this frame before it is released
            let size = ctx.layout.heap_size(&function.return_type)?;
            lowerer.emit(Instruction::LocalGet(result_pointer));
            lowerer.lower(&function.body)?;
            lowerer.emit(Instruction::I32Const(size as i32));
            lowerer.emit(memory_copy());
            lowerer.emit(Instruction::LocalGet(result_pointer));
        }
        None => lowerer.lower(&function.body)?,
    }

    lowerer.finish()
}

struct FunctionLowerer<'a, 'b> {
    ctx: &'b CodegenContext<'a>,
    locals: LocalManager,
    instructions: Vec<Instruction<'static>>,
    frame_size: u32,
    frame_pointer: Option<u32>,
}

impl FunctionLowerer<'_, '_> {
    fn emit(&mut self, instruction: Instruction<'static>) {
        self.instructions.push(instruction);
    }

    fn layout(&self) -> &MemoryLayout<'_> {
        self.ctx.layout
    }

    fn finish(self) -> Result<LoweredBody, WasmGenerationError> {
        let frame_size = align_to(self.frame_size, FRAME_ALIGNMENT).ok_or_else(frame_too_large)?;
        let mut function = Function::new(self.locals.wasm_locals());

        let frame = match self.frame_pointer {
            Some(frame_pointer) if frame_size > 0 => Some(frame_pointer),
            _ => None,
        };

        if let Some(frame_pointer) = frame {
            function.instruction(&Instruction::GlobalGet(self.ctx.stack_pointer));
            function.instruction(&Instruction::I32Const(frame_size as i32));
            function.instruction(&Instruction::I32Sub);
            function.instruction(&Instruction::LocalTee(frame_pointer));
            function.instruction(&Instruction::GlobalSet(self.ctx.stack_pointer));
        }

        for instruction in &self.instructions {
            function.instruction(instruction);
        }

        if let Some(frame_pointer) = frame {
            function.instruction(&Instruction::LocalGet(frame_pointer));
            function.instruction(&Instruction::I32Const(frame_size as i32));
            function.instruction(&Instruction::I32Add);
            function.instruction(&Instruction::GlobalSet(self.ctx.stack_pointer));
        }

        function.instruction(&Instruction::End);

        Ok(LoweredBody {
            function,
            frame_size: if frame.is_some() { frame_size } else { 0 },
        })
    }

    // =========================================================================
    // Frame slots
    // =========================================================================
    fn frame_pointer(&mut self) -> u32 {
        match self.frame_pointer {
            Some(local) => local,
            None => {
                let local = self.locals.allocate(ValType::I32);
                self.frame_pointer = Some(local);
                local
            }
        }
    }

    /// Reserves `size` bytes of the frame and returns their offset from the frame pointer.
    /// The frame must stay small enough to align, so `finish` never overflows.
    fn reserve(&mut self, ty: &Type, size: u32) -> Result<u32, WasmGenerationError> {
        self.frame_pointer();
        let offset = self.frame_size;
        self.frame_size = offset
            .checked_add(size)
            .filter(|end| align_to(*end, FRAME_ALIGNMENT).is_some())
            .ok_or_else(|| too_large(ty))?;
        Ok(offset)
    }

    fn frame_address(&mut self, offset: u32) {
        let frame_pointer = self.frame_pointer();
        self.emit(Instruction::LocalGet(frame_pointer));
        self.emit(Instruction::I32Const(offset as i32));
        self.emit(Instruction::I32Add);
    }

    // =========================================================================
    // Expressions
    // =========================================================================
    fn lower(&mut self, expression: &Expression) -> Result<(), WasmGenerationError> {
        match &expression.kind {
            ExpressionKind::Int(value) => self.lower_int(*value, &expression.data_type),
            ExpressionKind::Float(value) => self.lower_float(*value, &expression.data_type),
            ExpressionKind::Bool(value) => {
                self.emit(Instruction::I32Const(*value as i32));
                Ok(())
            }

            ExpressionKind::Tuple(elements) => {
                if elements.is_empty() {
                    return Ok(());
                }

                let types: Vec<Type> = elements.iter().map(|e| e.data_type.to_owned()).collect();
                let offsets = self.layout().tuple_offsets(&types)?;
                let size = self.layout().heap_size(&expression.data_type)?;
                self.write_aggregate(&expression.data_type, elements, &offsets, size)
            }

            ExpressionKind::Array(elements) => {
                let Type::Array { element, .. } = &expression.data_type else {
                    return Err(WasmGenerationError::instruction_lowering(
                        "array literal",
                        format!("its type is '{}' instead of an array", expression.data_type),
                    ));
                };

                // The total size is checked first, so no element offset can overflow
                let size = self.layout().heap_size(&expression.data_type)?;
                let element_size = self.layout().heap_size(element)?;
                let offsets: Vec<u32> = (0..elements.len() as u32)
                    .map(|index| index * element_size)
                    .collect();
                self.write_aggregate(&expression.data_type, elements, &offsets, size)
            }

            ExpressionKind::Local(id) => {
                if let Some(index) = self.locals.param(*id) {
                    self.emit(Instruction::LocalGet(index));
                }
                Ok(())
            }

            ExpressionKind::Call(call) => self.lower_call(call),

            ExpressionKind::Cast { value, .. } => {
                self.lower_conversion(value, &expression.data_type)
            }

            ExpressionKind::Reference(value) => {
                self.lower_conversion(value, &expression.data_type)
            }

            ExpressionKind::Dereference(value) => {
                self.lower(value)?;
                self.read_through_pointer(&expression.data_type)
            }

            ExpressionKind::Block {
                expressions,
                has_value,
            } => {
                let last = expressions.len().saturating_sub(1);
                for (index, inner) in expressions.iter().enumerate() {
                    if *has_value && index == last {
                        self.lower(inner)?;
                    } else {
                        self.lower_discarded(inner)?;
                    }
                }
                Ok(())
            }

            ExpressionKind::Match(hir_match) => self.lower_match(hir_match, &expression.data_type),

            ExpressionKind::Unary { .. } | ExpressionKind::Binary { .. } => {
                Err(WasmGenerationError::instruction_lowering(
                    format!("operator expression '{expression}'"),
                    "literal operator trees are folded before codegen",
                ))
            }
        }
    }

    fn lower_discarded(&mut self, expression: &Expression) -> Result<(), WasmGenerationError> {
        self.lower(expression)?;
        if self.layout().stack_type(&expression.data_type)?.is_some() {
            self.emit(Instruction::Drop);
        }
        Ok(())
    }

    fn lower_int(&mut self, value: i128, ty: &Type) -> Result<(), WasmGenerationError> {
        // Values are stored wrapped, so truncation keeps the two's complement bit pattern
        match self.layout().stack_type(ty)? {
            Some(ValType::I32) => self.emit(Instruction::I32Const(value as i32)),
            Some(ValType::I64) => self.emit(Instruction::I64Const(value as i64)),
            _ => {
                return Err(WasmGenerationError::instruction_lowering(
                    format!("integer literal {value}"),
                    format!("'{ty}' is not an integer type"),
                ));
            }
        }
        Ok(())
    }

    fn lower_float(&mut self, value: f64, ty: &Type) -> Result<(), WasmGenerationError> {
        match self.layout().stack_type(ty)? {
            Some(ValType::F32) => self.emit(Instruction::F32Const(Ieee32::from(value as f32))),
            Some(ValType::F64) => self.emit(Instruction::F64Const(Ieee64::from(value))),
            _ => {
                return Err(WasmGenerationError::instruction_lowering(
                    format!("float literal {value}"),
                    format!("'{ty}' is not a float type"),
                ));
            }
        }
        Ok(())
    }

    /// Writes a tuple or array literal into a new frame slot and pushes its address.
    fn write_aggregate(
        &mut self,
        ty: &Type,
        elements: &[Expression],
        offsets: &[u32],
        size: u32,
    ) -> Result<(), WasmGenerationError> {
        if size == 0 {
            for element in elements {
                self.lower_discarded(element)?;
            }
            self.emit(Instruction::I32Const(0));
            return Ok(());
        }

        let slot = self.reserve(ty, size)?;
        let frame_pointer = self.frame_pointer();
        for (element, offset) in elements.iter().zip(offsets) {
            self.store_value(frame_pointer, slot + offset, element)?;
        }

        self.frame_address(slot);
        Ok(())
    }

    /// Stores a value at `base + offset`, copying compound values.
    fn store_value(
        &mut self,
        base: u32,
        offset: u32,
        value: &Expression,
    ) -> Result<(), WasmGenerationError> {
        let ty = &value.data_type;

        if is_compound(ty) {
            let size = self.layout().heap_size(ty)?;
            if size == 0 {
                return self.lower_discarded(value);
            }

            self.emit(Instruction::LocalGet(base));
            self.emit(Instruction::I32Const(offset as i32));
            self.emit(Instruction::I32Add);
            self.lower(value)?;
            self.emit(Instruction::I32Const(size as i32));
            self.emit(memory_copy());
            return Ok(());
        }

        if self.layout().stack_type(ty)?.is_none() {
            return self.lower(value);
        }

        self.emit(Instruction::LocalGet(base));
        self.lower(value)?;
        self.emit(store_instruction(ty, offset)?);
        Ok(())
    }

    /// Turns the address on the stack into the value it points at.
    fn read_through_pointer(&mut self, target: &Type) -> Result<(), WasmGenerationError> {
        // A compound value is already represented by its address
        if is_compound(target) {
            return Ok(());
        }

        if self.layout().stack_type(target)?.is_none() {
            self.emit(Instruction::Drop);
            return Ok(());
        }

        self.emit(load_instruction(target, 0)?);
        Ok(())
    }

    /// Pushes the address of a value, spilling scalars into the frame.
    fn lower_address_of(&mut self, value: &Expression) -> Result<(), WasmGenerationError> {
        let ty = &value.data_type;

        if is_compound(ty) {
            return self.lower(value);
        }

        if self.layout().stack_type(ty)?.is_none() {
            self.lower(value)?;
            self.emit(Instruction::I32Const(0));
            return Ok(());
        }

        let size = self.layout().heap_size(ty)?;
        let slot = self.reserve(ty, size)?;
        let frame_pointer = self.frame_pointer();
        self.emit(Instruction::LocalGet(frame_pointer));
        self.lower(value)?;
        self.emit(store_instruction(ty, slot)?);
        self.frame_address(slot);
        Ok(())
    }

    // =========================================================================
    // Casts
    // =========================================================================
    fn lower_conversion(&mut self, value: &Expression, to: &Type) -> Result<(), WasmGenerationError> {
        let from = &value.data_type;

        if from.same_ignoring_lifetimes(to) {
            return self.lower(value);
        }

        match (from, to) {
            (Type::Primitive(from_kind), Type::Primitive(to_kind)) => {
                self.lower(value)?;
                self.convert_primitive(*from_kind, *to_kind)
            }

            // &T -> *T, the address is the same
            (Type::Reference { target, .. }, Type::Pointer(pointee))
                if target.same_ignoring_lifetimes(pointee) =>
            {
                self.lower(value)
            }

            // T -> &T and T -> *T
            (_, Type::Reference { target, .. }) | (_, Type::Pointer(target))
                if from.same_ignoring_lifetimes(target) =>
            {
                self.lower_address_of(value)
            }

            // T -> (T), a mono-tuple is laid out exactly like its element
            (_, Type::Tuple(elements))
                if elements.len() == 1 && from.same_ignoring_lifetimes(&elements[0]) =>
            {
                self.lower_address_of(value)
            }

            // (T) -> T
            (Type::Tuple(elements), _)
                if elements.len() == 1 && elements[0].same_ignoring_lifetimes(to) =>
            {
                self.lower(value)?;
                self.read_through_pointer(to)
            }

            _ => Err(WasmGenerationError::instruction_lowering(
                format!("cast from '{from}' to '{to}'"),
                "the cast should have been rejected during type checking",
            )),
        }
    }

    fn convert_primitive(
        &mut self,
        from: PrimitiveKind,
        to: PrimitiveKind,
    ) -> Result<(), WasmGenerationError> {
        if from.is_integer() && to.is_integer() {
            // Narrow stack values are already sign or zero extended, so only a change of
            // stack width needs an instruction
            match (from.stack_width(), to.stack_width()) {
                (StackWidth::I32, StackWidth::I64) => {
                    if from.is_signed() {
                        self.emit(Instruction::I64ExtendI32S);
                    } else {
                        self.emit(Instruction::I64ExtendI32U);
                    }
                    return Ok(());
                }
                (from_width, to_width) if from_width == to_width => return Ok(()),
                _ => {}
            }
        } else if from.is_integer() && to == PrimitiveKind::Bool {
            match from.stack_width() {
                StackWidth::I64 => {
                    self.emit(Instruction::I64Const(0));
                    self.emit(Instruction::I64Ne);
                }
                _ => {
                    self.emit(Instruction::I32Const(0));
                    self.emit(Instruction::I32Ne);
                }
            }
            return Ok(());
        } else if from == PrimitiveKind::F32 && to == PrimitiveKind::F64 {
            self.emit(Instruction::F64PromoteF32);
            return Ok(());
        }

        Err(WasmGenerationError::instruction_lowering(
            format!("cast from '{from}' to '{to}'"),
            "no instruction sequence exists for this conversion",
        ))
    }

    // =========================================================================
    // Calls
    // =========================================================================
    fn lower_call(&mut self, call: &CanonicalCall) -> Result<(), WasmGenerationError> {
        let Some(&index) = self.ctx.function_indices.get(&call.target) else {
            return Err(WasmGenerationError::instruction_lowering(
                format!("call to function {}", call.target.id.0),
                "the callee was never added to the module",
            ));
        };

        // The callee writes a compound result into a slot of this frame
        if is_compound(&call.return_type) {
            let size = self.layout().heap_size(&call.return_type)?;
            let slot = self.reserve(&call.return_type, size)?;
            self.frame_address(slot);
        }

        for arg in &call.args {
            match arg.cast {
                CastKind::Identity => self.lower(&arg.value)?,
                CastKind::Implicit => self.lower_conversion(&arg.value, &arg.param_type)?,
                CastKind::ExplicitOnly | CastKind::Illegal => {
                    return Err(WasmGenerationError::instruction_lowering(
                        format!("argument '{}'", arg.value),
                        format!("call arguments can't carry a {:?} cast", arg.cast),
                    ));
                }
            }
        }

        self.emit(Instruction::Call(index));
        Ok(())
    }

    // =========================================================================
    // Match
    // =========================================================================

    /// Lowers the decision tree to a chain of nested `if`/`else` blocks.
    fn lower_match(
        &mut self,
        hir_match: &HirMatch,
        result_type: &Type,
    ) -> Result<(), WasmGenerationError> {
        let scrutinee_type = &hir_match.scrutinee.data_type;

        self.lower(&hir_match.scrutinee)?;
        let scrutinee = match self.layout().stack_type(scrutinee_type)? {
            Some(val_type) => {
                let local = self.locals.allocate(val_type);
                self.emit(Instruction::LocalSet(local));
                Some(local)
            }
            None => None,
        };

        let block_type = match self.layout().stack_type(result_type)? {
            Some(val_type) => BlockType::Result(val_type),
            None => BlockType::Empty,
        };

        let mut open_blocks = 0;
        let mut closed = false;
        for test in &hir_match.decision.tests {
            let Some(body) = hir_match.arms.get(test.arm) else {
                return Err(WasmGenerationError::instruction_lowering(
                    format!("match arm {}", test.arm),
                    "the decision tree points at an arm that doesn't exist",
                ));
            };

            if test.is_unconditional() {
                self.lower(body)?;
                closed = true;
                break;
            }

            let (Some(local), Type::Primitive(kind)) = (scrutinee, scrutinee_type) else {
                return Err(WasmGenerationError::instruction_lowering(
                    format!("match on '{scrutinee_type}'"),
                    "only primitive scrutinees can be tested against literals",
                ));
            };

            self.lower_conditions(local, *kind, &test.conditions)?;
            self.emit(Instruction::If(block_type));
            self.lower(body)?;
            self.emit(Instruction::Else);
            open_blocks += 1;
        }

        if !closed {
            if !hir_match.decision.exhaustive_by_enumeration {
                return Err(WasmGenerationError::instruction_lowering(
                    format!("match on '{scrutinee_type}'"),
                    "a non-exhaustive match reached codegen",
                ));
            }

            // Every value was listed, so falling through every test can't happen
            self.emit(Instruction::Unreachable);
        }

        for _ in 0..open_blocks {
            self.emit(Instruction::End);
        }

        Ok(())
    }

    /// Pushes an i32 that is non-zero when any condition holds.
    fn lower_conditions(
        &mut self,
        scrutinee: u32,
        kind: PrimitiveKind,
        conditions: &[Condition],
    ) -> Result<(), WasmGenerationError> {
        let width = kind.stack_width();
        let signed = kind.is_signed();

        for (index, condition) in conditions.iter().enumerate() {
            match condition {
                Condition::Always => self.emit(Instruction::I32Const(1)),
                Condition::Equals(value) => {
                    self.emit(Instruction::LocalGet(scrutinee));
                    self.pattern_const(kind, *value)?;
                    self.emit(equal_instruction(width));
                }
                Condition::Range { start, end } => {
                    self.emit(Instruction::LocalGet(scrutinee));
                    self.pattern_const(kind, PatternValue::Int(*start))?;
                    self.emit(at_least_instruction(width, signed));
                    self.emit(Instruction::LocalGet(scrutinee));
                    self.pattern_const(kind, PatternValue::Int(*end))?;
                    self.emit(at_most_instruction(width, signed));
                    self.emit(Instruction::I32And);
                }
            }

            if index > 0 {
                self.emit(Instruction::I32Or);
            }
        }

        Ok(())
    }

    fn pattern_const(
        &mut self,
        kind: PrimitiveKind,
        value: PatternValue,
    ) -> Result<(), WasmGenerationError> {
        let ty = Type::Primitive(kind);
        match value {
            PatternValue::Int(value) => self.lower_int(value, &ty),
            PatternValue::Float(value) => self.lower_float(value, &ty),
            PatternValue::Bool(value) => {
                self.emit(Instruction::I32Const(value as i32));
                Ok(())
            }
        }
    }
}

fn equal_instruction(width: StackWidth) -> Instruction<'static> {
    match width {
        StackWidth::I32 => Instruction::I32Eq,
        StackWidth::I64 => Instruction::I64Eq,
        StackWidth::F32 => Instruction::F32Eq,
        StackWidth::F64 => Instruction::F64Eq,
    }
}

// Ranges only exist for integer kinds
fn at_least_instruction(width: StackWidth, signed: bool) -> Instruction<'static> {
    match (width, signed) {
        (StackWidth::I64, true) => Instruction::I64GeS,
        (StackWidth::I64, false) => Instruction::I64GeU,
        (_, true) => Instruction::I32GeS,
        (_, false) => Instruction::I32GeU,
    }
}

fn at_most_instruction(width: StackWidth, signed: bool) -> Instruction<'static> {
    match (width, signed) {
        (StackWidth::I64, true) => Instruction::I64LeS,
        (StackWidth::I64, false) => Instruction::I64LeU,
        (_, true) => Instruction::I32LeS,
        (_, false) => Instruction::I32LeU,
    }
}

fn memory_copy() -> Instruction<'static> {
    Instruction::MemoryCopy {
        src_mem: 0,
        dst_mem: 0,
    }
}

/// Rounds `value` up to a multiple of `alignment`, or `None` past `u32::MAX`.
pub fn align_to(value: u32, alignment: u32) -> Option<u32> {
    value.checked_next_multiple_of(alignment)
}

fn frame_too_large() -> WasmGenerationError {
    WasmGenerationError::instruction_lowering(
        "stack frame",
        "reserve should have kept the frame alignable",
    )
}

#[cfg(test)]
#[path = "tests/function_lowerer_tests.rs"]
mod tests;
