//! Type-directed expression emitters.
//!
//! One emitter per value kind. Each takes an expression subtree and leaves
//! exactly one value of its kind on the operand stack; the stack is the
//! only result channel. Which emitter runs is decided by the declared kind
//! of the consuming context (assignment target, parameter, return kind),
//! never re-inferred from scratch.
//!
//! A node whose kind does not match the running emitter is a construct the
//! checker should have rejected; the emitters emit nothing for it and
//! return normally, leaning on the checker as the real gate.

pub mod boolean;
mod call;
mod int;
mod string;

pub use boolean::BoolDest;

use crate::error::CodegenResult;
use crate::function::FunctionEmitter;
use quill_ast::{Expr, ExprKind, Span, ValueKind};

impl FunctionEmitter<'_> {
    /// Emit `expr` so that one value of `kind` ends up on the stack.
    pub(crate) fn emit_expr(&mut self, expr: &Expr, kind: ValueKind) -> CodegenResult<()> {
        match kind {
            ValueKind::Int => self.emit_int_expr(expr),
            ValueKind::Str => self.emit_str_expr(expr),
            ValueKind::Bool => self.emit_bool_expr(expr, BoolDest::Value),
            ValueKind::Void => match &expr.kind {
                ExprKind::Call { name, args } => {
                    self.emit_call_expr(name, args, expr.span).map(|_| ())
                }
                _ => Ok(()),
            },
        }
    }

    /// Emit an expression in statement position, discarding any result.
    pub(crate) fn emit_expr_stmt(&mut self, expr: &Expr) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::Call { name, args } => {
                let produced = self.emit_call_expr(name, args, expr.span)?;
                if produced != ValueKind::Void {
                    self.builder.emit_pop();
                }
                Ok(())
            }
            _ => {
                let kind = self.expr_kind(expr)?;
                self.emit_expr(expr, kind)?;
                if kind != ValueKind::Void {
                    self.builder.emit_pop();
                }
                Ok(())
            }
        }
    }

    /// The value kind `expr` produces, per the checker's verdicts recorded
    /// in the symbol table and builtin registry.
    pub(crate) fn expr_kind(&self, expr: &Expr) -> CodegenResult<ValueKind> {
        match &expr.kind {
            ExprKind::Int(_) => Ok(ValueKind::Int),
            ExprKind::Bool(_) => Ok(ValueKind::Bool),
            ExprKind::Str(_) => Ok(ValueKind::Str),
            ExprKind::Name(name) => {
                let (symbol, _) = self.table.resolve(name, expr.span)?;
                Ok(symbol.value_kind())
            }
            ExprKind::Binary { left, .. } => self.expr_kind(left),
            ExprKind::Neg(_) => Ok(ValueKind::Int),
            ExprKind::Compare { .. } | ExprKind::Logical { .. } | ExprKind::Not(_) => {
                Ok(ValueKind::Bool)
            }
            ExprKind::Call { name, args } => self.call_kind(name, args, expr.span),
        }
    }

    /// Resolve an identifier and push its value, reading static storage for
    /// global bindings and a local slot otherwise. Returns the kind pushed.
    pub(crate) fn emit_name_load(&mut self, name: &str, at: Span) -> CodegenResult<ValueKind> {
        let (symbol, depth) = self.table.resolve(name, at)?;
        let kind = symbol.value_kind();
        let source_name = symbol.name.clone();
        let augmented = symbol.augmented.clone();

        if depth == 0 {
            let index = self.global_index(&source_name)?;
            self.builder.emit_load_global(index, kind);
        } else {
            let slot = self.builder.local_slot(&augmented)?;
            self.builder.emit_load_local(slot);
        }
        Ok(kind)
    }
}
