//! Stack-based bytecode system.
//!
//! Key components:
//!
//! - [`Instruction`] - the stack-machine instruction set
//! - [`BodyBuilder`] - emission API for one function body
//! - [`CompiledBody`] / [`CompiledUnit`] - immutable compiled artifacts

mod builder;
mod instruction;
mod unit;

pub use builder::{BodyBuilder, FrameImage};
pub use instruction::{
    FuncIndex, GlobalIndex, Instruction, IntCmp, Label, LocalSlot, StrIndex,
};
pub use unit::{CompiledBody, CompiledUnit, GlobalField, LineTableEntry, disassemble};
