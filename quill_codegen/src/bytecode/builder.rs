//! Body builder for bytecode emission.
//!
//! `BodyBuilder` provides the emission API one function body is built
//! through: typed instruction emitters, local-slot allocation keyed by
//! augmented names, string-constant interning, write-once labels, and a
//! simulated operand stack.
//!
//! The simulated stack mirrors what the verifier of the target machine
//! would see. Emitters capture a [`FrameImage`] before a jump sequence and
//! hand it back when binding the label the jumps land on, so every merge
//! point carries one consistent stack shape.

use super::instruction::{
    FuncIndex, GlobalIndex, Instruction, IntCmp, Label, LocalSlot, StrIndex,
};
use super::unit::{CompiledBody, LineTableEntry};
use crate::builtins::Builtin;
use crate::error::{CodegenError, CodegenResult};
use quill_ast::ValueKind;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// The shape of the simulated operand stack at one point in emission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameImage(SmallVec<[ValueKind; 8]>);

impl FrameImage {
    /// Stack depth of the image.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

/// Builder for one function body.
pub struct BodyBuilder {
    /// Body name.
    name: Arc<str>,
    /// Number of parameters (they occupy slots `0..param_count`).
    param_count: u16,
    /// Declared return kind.
    returns: ValueKind,

    /// Emitted instructions.
    instructions: Vec<Instruction>,

    /// String-constant pool.
    strings: Vec<Arc<str>>,
    /// Pool deduplication map.
    string_map: FxHashMap<Arc<str>, StrIndex>,

    /// Local slots in allocation order: augmented name and kind.
    locals: Vec<(Arc<str>, ValueKind)>,
    /// Augmented name to slot map.
    local_map: FxHashMap<Arc<str>, LocalSlot>,

    /// Label bind points, indexed by label id. `None` until bound.
    labels: Vec<Option<u32>>,

    /// Simulated operand stack.
    sim: SmallVec<[ValueKind; 8]>,
    /// High-water mark of the simulated stack.
    max_stack: u16,

    /// Line number table entries.
    line_table: Vec<LineTableEntry>,
    /// Current source line.
    current_line: u32,
    /// Start pc for the current line.
    line_start_pc: u32,
}

impl BodyBuilder {
    /// Create a builder for a body with the given name and return kind.
    pub fn new(name: impl Into<Arc<str>>, returns: ValueKind) -> Self {
        Self {
            name: name.into(),
            param_count: 0,
            returns,
            instructions: Vec::new(),
            strings: Vec::new(),
            string_map: FxHashMap::default(),
            locals: Vec::new(),
            local_map: FxHashMap::default(),
            labels: Vec::new(),
            sim: SmallVec::new(),
            max_stack: 0,
            line_table: Vec::new(),
            current_line: 1,
            line_start_pc: 0,
        }
    }

    /// Set the source line for subsequent instructions.
    pub fn set_line(&mut self, line: u32) {
        if line != self.current_line {
            let current_pc = self.instructions.len() as u32;
            if current_pc > self.line_start_pc {
                self.line_table.push(LineTableEntry {
                    start_pc: self.line_start_pc,
                    end_pc: current_pc,
                    line: self.current_line,
                });
            }
            self.current_line = line;
            self.line_start_pc = current_pc;
        }
    }

    // =========================================================================
    // Local Slots
    // =========================================================================

    /// Register a local under its augmented name, returning its slot.
    ///
    /// Re-registering the same augmented name returns the existing slot;
    /// augmented names are unique across shadowing scopes, so distinct
    /// locals never collide.
    pub fn define_local(&mut self, augmented: Arc<str>, kind: ValueKind) -> LocalSlot {
        if let Some(&slot) = self.local_map.get(&augmented) {
            return slot;
        }
        let slot = LocalSlot::new(self.locals.len() as u16);
        self.local_map.insert(augmented.clone(), slot);
        self.locals.push((augmented, kind));
        slot
    }

    /// Mark the first `count` slots as parameters.
    pub fn set_param_count(&mut self, count: u16) {
        self.param_count = count;
    }

    /// Look up the slot of a registered local.
    pub fn local_slot(&self, augmented: &str) -> CodegenResult<LocalSlot> {
        self.local_map
            .get(augmented)
            .copied()
            .ok_or_else(|| CodegenError::UnknownLocal {
                name: augmented.to_string(),
            })
    }

    // =========================================================================
    // Labels and Frames
    // =========================================================================

    /// Create a fresh, unbound label.
    pub fn create_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        label
    }

    /// Bind `label` to the current position.
    ///
    /// Use this only where the fall-through stack shape already matches
    /// every jump into the label; otherwise use [`Self::bind_label_at`].
    pub fn bind_label(&mut self, label: Label) -> CodegenResult<()> {
        self.bind(label)
    }

    /// Bind `label` to the current position with the stack shape captured
    /// when the jumps into it were emitted.
    pub fn bind_label_at(&mut self, label: Label, frame: &FrameImage) -> CodegenResult<()> {
        let falls_through = self
            .instructions
            .last()
            .map_or(true, |inst| !inst.is_terminator());
        if falls_through && self.sim != frame.0 {
            return Err(CodegenError::internal(format!(
                "stack shape mismatch at {label}: fall-through depth {}, jump depth {}",
                self.sim.len(),
                frame.depth()
            )));
        }
        self.bind(label)?;
        self.sim = frame.0.clone();
        Ok(())
    }

    fn bind(&mut self, label: Label) -> CodegenResult<()> {
        let pc = self.instructions.len() as u32;
        let entry = &mut self.labels[label.index()];
        if entry.is_some() {
            return Err(CodegenError::internal(format!("{label} bound twice")));
        }
        *entry = Some(pc);
        Ok(())
    }

    /// Capture the current simulated stack shape.
    pub fn frame(&self) -> FrameImage {
        FrameImage(self.sim.clone())
    }

    // =========================================================================
    // Instruction Emission
    // =========================================================================

    fn emit(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    fn push_sim(&mut self, kind: ValueKind) {
        self.sim.push(kind);
        self.max_stack = self.max_stack.max(self.sim.len() as u16);
    }

    fn pop_sim(&mut self) {
        debug_assert!(!self.sim.is_empty(), "operand stack underflow in emitter");
        self.sim.pop();
    }

    /// Push an integer constant.
    pub fn emit_push_int(&mut self, value: i64) {
        self.emit(Instruction::PushInt(value));
        self.push_sim(ValueKind::Int);
    }

    /// Push a boolean constant.
    pub fn emit_push_bool(&mut self, value: bool) {
        self.emit(Instruction::PushBool(value));
        self.push_sim(ValueKind::Bool);
    }

    /// Push a string constant, interning it in the pool.
    pub fn emit_push_str(&mut self, value: &str) {
        let idx = self.intern_str(value);
        self.emit(Instruction::PushStr(idx));
        self.push_sim(ValueKind::Str);
    }

    /// Intern a string in the constant pool.
    pub fn intern_str(&mut self, value: &str) -> StrIndex {
        if let Some(&idx) = self.string_map.get(value) {
            return idx;
        }
        let idx = StrIndex(self.strings.len() as u16);
        let value: Arc<str> = Arc::from(value);
        self.string_map.insert(value.clone(), idx);
        self.strings.push(value);
        idx
    }

    /// Load a local slot.
    pub fn emit_load_local(&mut self, slot: LocalSlot) {
        let kind = self.locals[slot.index()].1;
        self.emit(Instruction::LoadLocal(slot));
        self.push_sim(kind);
    }

    /// Store into a local slot.
    pub fn emit_store_local(&mut self, slot: LocalSlot) {
        self.emit(Instruction::StoreLocal(slot));
        self.pop_sim();
    }

    /// Load a global field of the given kind.
    pub fn emit_load_global(&mut self, index: GlobalIndex, kind: ValueKind) {
        self.emit(Instruction::LoadGlobal(index));
        self.push_sim(kind);
    }

    /// Store into a global field.
    pub fn emit_store_global(&mut self, index: GlobalIndex) {
        self.emit(Instruction::StoreGlobal(index));
        self.pop_sim();
    }

    /// Integer arithmetic on the top two stack values.
    pub fn emit_arith(&mut self, inst: Instruction) {
        debug_assert!(matches!(
            inst,
            Instruction::Add
                | Instruction::Sub
                | Instruction::Mul
                | Instruction::Div
                | Instruction::Rem
        ));
        self.emit(inst);
        self.pop_sim();
        self.pop_sim();
        self.push_sim(ValueKind::Int);
    }

    /// Negate the integer on top of the stack.
    pub fn emit_neg(&mut self) {
        self.emit(Instruction::Neg);
    }

    /// Boolean algebra on the top two stack values.
    pub fn emit_bool_op(&mut self, inst: Instruction) {
        debug_assert!(matches!(
            inst,
            Instruction::And | Instruction::Or | Instruction::Xor
        ));
        self.emit(inst);
        self.pop_sim();
        self.pop_sim();
        self.push_sim(ValueKind::Bool);
    }

    /// Unconditional jump.
    pub fn emit_jump(&mut self, label: Label) {
        self.emit(Instruction::Jump(label));
    }

    /// Pop a boolean and jump when it is false.
    pub fn emit_jump_if_false(&mut self, label: Label) {
        self.emit(Instruction::JumpIfFalse(label));
        self.pop_sim();
    }

    /// Pop a boolean and jump when it is true.
    pub fn emit_jump_if_true(&mut self, label: Label) {
        self.emit(Instruction::JumpIfTrue(label));
        self.pop_sim();
    }

    /// Pop two integers and jump when the condition holds.
    pub fn emit_jump_int_cmp(&mut self, cmp: IntCmp, label: Label) {
        self.emit(Instruction::JumpIntCmp(cmp, label));
        self.pop_sim();
        self.pop_sim();
    }

    /// Pop two strings and jump when their equality matches `when_equal`.
    pub fn emit_jump_str_eq(&mut self, when_equal: bool, label: Label) {
        self.emit(Instruction::JumpStrEq(when_equal, label));
        self.pop_sim();
        self.pop_sim();
    }

    /// Allocate a fresh text accumulator.
    pub fn emit_accum_new(&mut self) {
        self.emit(Instruction::NewAccum);
        self.push_sim(ValueKind::Str);
    }

    /// Append the string on top of the stack into the accumulator below it.
    pub fn emit_accum_push(&mut self) {
        self.emit(Instruction::AccumPush);
        self.pop_sim();
    }

    /// Finalise the accumulator into a plain string.
    pub fn emit_accum_finish(&mut self) {
        self.emit(Instruction::AccumFinish);
    }

    /// Invoke a unit function.
    pub fn emit_call(&mut self, index: FuncIndex, param_count: usize, returns: ValueKind) {
        self.emit(Instruction::Call(index));
        for _ in 0..param_count {
            self.pop_sim();
        }
        if returns != ValueKind::Void {
            self.push_sim(returns);
        }
    }

    /// Invoke a builtin. `pops` covers declared parameters plus any ambient
    /// context value the emitter pushed for it.
    pub fn emit_call_builtin(&mut self, builtin: Builtin, pops: usize, returns: ValueKind) {
        self.emit(Instruction::CallBuiltin(builtin));
        for _ in 0..pops {
            self.pop_sim();
        }
        if returns != ValueKind::Void {
            self.push_sim(returns);
        }
    }

    /// Discard the value on top of the stack.
    pub fn emit_pop(&mut self) {
        self.emit(Instruction::Pop);
        self.pop_sim();
    }

    /// Return with no value.
    pub fn emit_return(&mut self) {
        self.emit(Instruction::Return);
    }

    /// Return the value on top of the stack.
    pub fn emit_return_value(&mut self) {
        self.emit(Instruction::ReturnValue);
        self.pop_sim();
    }

    /// Whether the body currently ends in a return instruction.
    pub fn ends_with_return(&self) -> bool {
        self.instructions.last().is_some_and(|i| i.is_return())
    }

    // =========================================================================
    // Finalisation
    // =========================================================================

    /// Finish the body: validate that every label was bound and freeze the
    /// instruction stream.
    pub fn finish(mut self) -> CodegenResult<CompiledBody> {
        let mut targets = Vec::with_capacity(self.labels.len());
        for (id, bound) in self.labels.iter().enumerate() {
            match bound {
                Some(pc) => targets.push(*pc),
                None => return Err(CodegenError::UnboundLabel { id: id as u32 }),
            }
        }

        let final_pc = self.instructions.len() as u32;
        if final_pc > self.line_start_pc {
            self.line_table.push(LineTableEntry {
                start_pc: self.line_start_pc,
                end_pc: final_pc,
                line: self.current_line,
            });
        }

        Ok(CompiledBody {
            name: self.name,
            param_count: self.param_count,
            returns: self.returns,
            instructions: self.instructions.into_boxed_slice(),
            strings: self.strings.into_boxed_slice(),
            locals: self
                .locals
                .into_iter()
                .map(|(name, _)| name)
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            targets: targets.into_boxed_slice(),
            max_stack: self.max_stack,
            line_table: self.line_table.into_boxed_slice(),
        })
    }
}
