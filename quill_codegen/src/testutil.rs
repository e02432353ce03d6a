//! Shared helpers for emitter tests.

use crate::bytecode::{CompiledBody, CompiledUnit};
use crate::error::CodegenResult;
use crate::unit::UnitEmitter;
use quill_ast::{Program, Span, Stmt, StmtKind, ValueKind};

/// Generate a unit from top-level statements, propagating errors.
pub(crate) fn compile_unit_result(body: Vec<Stmt>) -> CodegenResult<CompiledUnit> {
    UnitEmitter::new("test.ql").emit(&Program::new(body))
}

/// Generate a unit and return its entry body.
pub(crate) fn compile_entry(body: Vec<Stmt>) -> CompiledBody {
    compile_unit_result(body)
        .expect("unit generates")
        .entry_body()
        .expect("unit has an entry body")
        .clone()
}

fn global(name: &str, kind: ValueKind, span: Span) -> Stmt {
    Stmt::new(
        StmtKind::Decl {
            name: name.to_string(),
            kind,
            init: None,
            folded: None,
        },
        span,
    )
}

/// An uninitialised top-level integer declaration.
pub(crate) fn int_global(name: &str, span: Span) -> Stmt {
    global(name, ValueKind::Int, span)
}

/// An uninitialised top-level boolean declaration.
pub(crate) fn bool_global(name: &str, span: Span) -> Stmt {
    global(name, ValueKind::Bool, span)
}

/// An uninitialised top-level string declaration.
pub(crate) fn str_global(name: &str, span: Span) -> Stmt {
    global(name, ValueKind::Str, span)
}
