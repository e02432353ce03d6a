//! Compiled unit representation.
//!
//! A `CompiledUnit` is the in-memory artifact handed to the external unit
//! writer: global field declarations with optional constant initial values,
//! plus one `CompiledBody` per function. Both are immutable once built.

use super::instruction::Instruction;
use quill_ast::{Constant, ValueKind};
use std::sync::Arc;

/// A compiled function body.
#[derive(Debug, Clone)]
pub struct CompiledBody {
    /// Body name.
    pub name: Arc<str>,

    /// Number of parameters; they occupy slots `0..param_count` in
    /// declaration order.
    pub param_count: u16,

    /// Declared return kind.
    pub returns: ValueKind,

    /// Instructions.
    pub instructions: Box<[Instruction]>,

    /// String-constant pool.
    pub strings: Box<[Arc<str>]>,

    /// Local slot names (augmented), in slot order.
    pub locals: Box<[Arc<str>]>,

    /// Label table: label id to instruction index.
    pub targets: Box<[u32]>,

    /// Maximum operand-stack depth.
    pub max_stack: u16,

    /// Line number table.
    pub line_table: Box<[LineTableEntry]>,
}

impl CompiledBody {
    /// Get the source line for an instruction index.
    pub fn line_for_pc(&self, pc: u32) -> Option<u32> {
        for entry in self.line_table.iter() {
            if entry.start_pc <= pc && pc < entry.end_pc {
                return Some(entry.line);
            }
        }
        None
    }
}

/// Line table entry mapping instruction ranges to source lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTableEntry {
    /// Starting instruction index (inclusive).
    pub start_pc: u32,
    /// Ending instruction index (exclusive).
    pub end_pc: u32,
    /// Source line number.
    pub line: u32,
}

/// A module-level storage declaration.
#[derive(Debug, Clone)]
pub struct GlobalField {
    /// Field name.
    pub name: Arc<str>,
    /// Value kind.
    pub kind: ValueKind,
    /// Constant initial value when the checker folded one; `None` means the
    /// kind's default value, with any non-constant initialiser assigned at
    /// the top of the entry body.
    pub init: Option<Constant>,
}

/// One compiled translation unit.
#[derive(Debug, Clone)]
pub struct CompiledUnit {
    /// Externally visible unit name.
    pub name: Arc<str>,
    /// Source identifier the unit was generated from.
    pub source: Arc<str>,
    /// Module-level storage.
    pub globals: Box<[GlobalField]>,
    /// Function bodies; indices match `FuncIndex` values in call sites.
    pub functions: Box<[CompiledBody]>,
    /// Index of the entry body, when the unit has top-level statements.
    pub entry: Option<u16>,
}

impl CompiledUnit {
    /// The entry body, if any.
    pub fn entry_body(&self) -> Option<&CompiledBody> {
        self.entry.map(|i| &self.functions[i as usize])
    }
}

/// Disassemble a body to a string.
pub fn disassemble(body: &CompiledBody) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    writeln!(output, "Body: {}", body.name).unwrap();
    writeln!(output, "  Params: {}", body.param_count).unwrap();
    writeln!(output, "  Returns: {}", body.returns).unwrap();
    writeln!(output, "  Max stack: {}", body.max_stack).unwrap();

    if !body.strings.is_empty() {
        writeln!(output, "\nStrings:").unwrap();
        for (i, s) in body.strings.iter().enumerate() {
            writeln!(output, "  s{i}: {s:?}").unwrap();
        }
    }

    if !body.locals.is_empty() {
        writeln!(output, "\nLocals:").unwrap();
        for (i, l) in body.locals.iter().enumerate() {
            writeln!(output, "  {i:4}: {l}").unwrap();
        }
    }

    writeln!(output, "\nDisassembly:").unwrap();
    for (i, inst) in body.instructions.iter().enumerate() {
        let line = body.line_for_pc(i as u32);
        let line_str = line.map_or("    ".to_string(), |l| format!("{l:4}"));
        writeln!(output, "{line_str} {i:4}: {inst}").unwrap();
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::BodyBuilder;

    #[test]
    fn test_line_table_lookup() {
        let mut b = BodyBuilder::new("f", ValueKind::Void);
        b.set_line(10);
        b.emit_push_int(1);
        b.emit_pop();
        b.set_line(11);
        b.emit_return();
        let body = b.finish().unwrap();

        assert_eq!(body.line_for_pc(0), Some(10));
        assert_eq!(body.line_for_pc(1), Some(10));
        assert_eq!(body.line_for_pc(2), Some(11));
        assert_eq!(body.line_for_pc(3), None);
    }

    #[test]
    fn test_disassemble_mentions_instructions() {
        let mut b = BodyBuilder::new("greet", ValueKind::Void);
        b.emit_push_str("hello");
        b.emit_pop();
        b.emit_return();
        let body = b.finish().unwrap();

        let text = disassemble(&body);
        assert!(text.contains("Body: greet"));
        assert!(text.contains("push.str s0"));
        assert!(text.contains("\"hello\""));
    }
}
