//! Bytecode generation backend.
//!
//! Lowers a checked AST to stack-machine bytecode: expressions evaluate on
//! an operand stack, function locals live in indexed slots, module-level
//! declarations in static global fields. The entry point is
//! [`UnitEmitter`], which turns one [`quill_ast::Program`] into a
//! [`CompiledUnit`] ready for loading.
//!
//! Generation trusts the checker. Kind errors it would have caught are not
//! re-diagnosed here; when one slips through anyway, emission fails with a
//! [`CodegenError`] that says whose bug it is.

#![warn(missing_docs)]

pub mod builtins;
pub mod bytecode;
mod control;
pub mod dispatch;
pub mod error;
pub mod expr;
mod function;
pub mod scope;
pub mod symbol;
pub mod unit;

pub use bytecode::{disassemble, CompiledBody, CompiledUnit, GlobalField, Instruction};
pub use error::{CodegenError, CodegenResult};
pub use unit::{unit_name_from_source, UnitEmitter, ENTRY_NAME};

#[cfg(test)]
pub(crate) mod testutil;
