//! Stack-machine instruction set.
//!
//! The target executes over an operand stack, indexed local slots, and
//! static global fields. Jump instructions carry a [`Label`]; a body's
//! label table (built at finalisation) maps each label to its instruction
//! index.

use crate::builtins::Builtin;
use std::fmt;

/// A jump target placeholder, bound exactly once during emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub(crate) u32);

impl Label {
    /// Index into the body's label table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// An indexed local variable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSlot(pub(crate) u16);

impl LocalSlot {
    /// Create a slot.
    #[inline]
    pub const fn new(slot: u16) -> Self {
        Self(slot)
    }

    /// Slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the unit's global field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalIndex(pub(crate) u16);

impl GlobalIndex {
    /// Create an index.
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Field index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into a body's string-constant pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrIndex(pub(crate) u16);

impl StrIndex {
    /// Pool index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index into the unit's function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncIndex(pub(crate) u16);

impl FuncIndex {
    /// Create an index.
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Function index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Integer comparison condition for fused compare-and-branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntCmp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl IntCmp {
    /// The condition's logical negation, used when a branch must be taken
    /// on the comparison's falsehood.
    #[inline]
    pub const fn invert(self) -> Self {
        match self {
            IntCmp::Lt => IntCmp::Ge,
            IntCmp::Le => IntCmp::Gt,
            IntCmp::Gt => IntCmp::Le,
            IntCmp::Ge => IntCmp::Lt,
            IntCmp::Eq => IntCmp::Ne,
            IntCmp::Ne => IntCmp::Eq,
        }
    }
}

impl fmt::Display for IntCmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            IntCmp::Lt => "lt",
            IntCmp::Le => "le",
            IntCmp::Gt => "gt",
            IntCmp::Ge => "ge",
            IntCmp::Eq => "eq",
            IntCmp::Ne => "ne",
        };
        f.write_str(op)
    }
}

/// One instruction of the stack machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// Push an integer constant.
    PushInt(i64),
    /// Push a boolean constant (0/1 on the stack).
    PushBool(bool),
    /// Push a string constant from the pool.
    PushStr(StrIndex),
    /// Push a local slot's value.
    LoadLocal(LocalSlot),
    /// Pop into a local slot.
    StoreLocal(LocalSlot),
    /// Push a global field's value.
    LoadGlobal(GlobalIndex),
    /// Pop into a global field.
    StoreGlobal(GlobalIndex),
    /// Pop two integers, push their sum.
    Add,
    /// Pop two integers, push their difference.
    Sub,
    /// Pop two integers, push their product.
    Mul,
    /// Pop two integers, push their quotient.
    Div,
    /// Pop two integers, push their remainder.
    Rem,
    /// Negate the integer on top of the stack.
    Neg,
    /// Pop two booleans, push their conjunction (integer AND on 0/1).
    And,
    /// Pop two booleans, push their disjunction (integer OR on 0/1).
    Or,
    /// Pop two booleans, push their exclusive or (integer XOR on 0/1).
    Xor,
    /// Unconditional jump.
    Jump(Label),
    /// Pop a boolean, jump when it is false.
    JumpIfFalse(Label),
    /// Pop a boolean, jump when it is true.
    JumpIfTrue(Label),
    /// Pop two integers, jump when the condition holds between them.
    JumpIntCmp(IntCmp, Label),
    /// Pop two strings, jump when their equality matches the flag.
    JumpStrEq(bool, Label),
    /// Push an empty text accumulator.
    NewAccum,
    /// Pop a string and append it to the accumulator beneath it.
    AccumPush,
    /// Finalise the accumulator on top of the stack into a plain string.
    AccumFinish,
    /// Invoke a unit function; arguments are popped, a non-void result
    /// is pushed.
    Call(FuncIndex),
    /// Invoke a builtin; its declared parameters are popped, a non-void
    /// result is pushed.
    CallBuiltin(Builtin),
    /// Discard the value on top of the stack.
    Pop,
    /// Return with no value.
    Return,
    /// Return the value on top of the stack.
    ReturnValue,
}

impl Instruction {
    /// Whether this instruction unconditionally leaves the current
    /// instruction stream (no fall-through to the next instruction).
    #[inline]
    pub const fn is_terminator(self) -> bool {
        matches!(
            self,
            Instruction::Jump(_) | Instruction::Return | Instruction::ReturnValue
        )
    }

    /// Whether this instruction returns from the body.
    #[inline]
    pub const fn is_return(self) -> bool {
        matches!(self, Instruction::Return | Instruction::ReturnValue)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushInt(v) => write!(f, "push.int {v}"),
            Instruction::PushBool(v) => write!(f, "push.bool {v}"),
            Instruction::PushStr(idx) => write!(f, "push.str s{}", idx.index()),
            Instruction::LoadLocal(slot) => write!(f, "load.local {}", slot.index()),
            Instruction::StoreLocal(slot) => write!(f, "store.local {}", slot.index()),
            Instruction::LoadGlobal(idx) => write!(f, "load.global {}", idx.index()),
            Instruction::StoreGlobal(idx) => write!(f, "store.global {}", idx.index()),
            Instruction::Add => f.write_str("add"),
            Instruction::Sub => f.write_str("sub"),
            Instruction::Mul => f.write_str("mul"),
            Instruction::Div => f.write_str("div"),
            Instruction::Rem => f.write_str("rem"),
            Instruction::Neg => f.write_str("neg"),
            Instruction::And => f.write_str("and"),
            Instruction::Or => f.write_str("or"),
            Instruction::Xor => f.write_str("xor"),
            Instruction::Jump(l) => write!(f, "jump {l}"),
            Instruction::JumpIfFalse(l) => write!(f, "jump.false {l}"),
            Instruction::JumpIfTrue(l) => write!(f, "jump.true {l}"),
            Instruction::JumpIntCmp(cmp, l) => write!(f, "jump.{cmp} {l}"),
            Instruction::JumpStrEq(true, l) => write!(f, "jump.streq {l}"),
            Instruction::JumpStrEq(false, l) => write!(f, "jump.strne {l}"),
            Instruction::NewAccum => f.write_str("accum.new"),
            Instruction::AccumPush => f.write_str("accum.push"),
            Instruction::AccumFinish => f.write_str("accum.finish"),
            Instruction::Call(idx) => write!(f, "call f{}", idx.index()),
            Instruction::CallBuiltin(b) => write!(f, "call.builtin {b:?}"),
            Instruction::Pop => f.write_str("pop"),
            Instruction::Return => f.write_str("return"),
            Instruction::ReturnValue => f.write_str("return.value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_inversion() {
        assert_eq!(IntCmp::Lt.invert(), IntCmp::Ge);
        assert_eq!(IntCmp::Eq.invert(), IntCmp::Ne);
        for cmp in [
            IntCmp::Lt,
            IntCmp::Le,
            IntCmp::Gt,
            IntCmp::Ge,
            IntCmp::Eq,
            IntCmp::Ne,
        ] {
            assert_eq!(cmp.invert().invert(), cmp);
        }
    }

    #[test]
    fn test_terminators() {
        assert!(Instruction::Jump(Label(0)).is_terminator());
        assert!(Instruction::Return.is_terminator());
        assert!(!Instruction::JumpIfFalse(Label(0)).is_terminator());
        assert!(!Instruction::Pop.is_terminator());
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::PushInt(7).to_string(), "push.int 7");
        assert_eq!(
            Instruction::JumpIntCmp(IntCmp::Le, Label(3)).to_string(),
            "jump.le L3"
        );
    }
}
